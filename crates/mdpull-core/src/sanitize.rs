//! Turning fetched markdown into something safe to embed in a page.

use std::sync::LazyLock;

use regex::Regex;

/// Image embeds: `![alt](url)` or `![alt](<url>)`, alt text captured. The destination may
/// contain one level of balanced parentheses.
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!\[([^\]]*)\]\((?:<[^>]*>|(?:[^()]|\([^()]*\))*)\)").unwrap()
});

/// Complete `<script>` blocks, any case, spanning lines.
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").unwrap());

/// Complete `<iframe>` blocks, any case, spanning lines.
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static IFRAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<iframe\b[^>]*>.*?</iframe\s*>").unwrap());

/// Leftover opening/closing/self-closing tags once full blocks are gone.
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static STRAY_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?(?:script|iframe)\b[^>]*>").unwrap());

/// Sanitize fetched markdown for embedding.
///
/// - `![alt](url)` becomes `[alt]`, so third-party images are never loaded
/// - `<script>` and `<iframe>` blocks are removed, as are unmatched tags of either kind
/// - trailing whitespace collapses to a single final newline
///
/// ```rust
/// use mdpull_core::sanitize;
///
/// let out = sanitize("# Demo\n![screenshot](https://x/y.png)\n<script>alert(1)</script>\n\n");
/// assert_eq!(out, "# Demo\n[screenshot]\n");
/// ```
#[must_use]
pub fn sanitize(raw: &str) -> String {
    // Removing a tag can splice its neighbours into a new one; repeat until nothing changes.
    // Every pass that changes the text shortens it, so this terminates.
    let mut text = raw.to_string();
    loop {
        let stripped = strip_embeds(&text);
        if stripped == text {
            break;
        }
        text = stripped;
    }

    let without_images = IMAGE_RE.replace_all(&text, "[$1]");

    let mut out = without_images.trim_end().to_string();
    out.push('\n');
    out
}

fn strip_embeds(text: &str) -> String {
    let without_scripts = SCRIPT_RE.replace_all(text, "");
    let without_iframes = IFRAME_RE.replace_all(&without_scripts, "");
    STRAY_TAG_RE.replace_all(&without_iframes, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_image_becomes_alt_text() {
        assert_eq!(sanitize("![alt](http://x/y.png)"), "[alt]\n");
        assert_eq!(
            sanitize("before ![a b](https://x/a.gif \"title\") after"),
            "before [a b] after\n"
        );
        assert_eq!(sanitize("![](https://x/empty.png)"), "[]\n");
    }

    #[test]
    fn test_image_with_parentheses_in_url() {
        assert_eq!(
            sanitize("![diagram](https://upload.wikimedia.org/Foo_(bar).png)"),
            "[diagram]\n"
        );
        assert_eq!(
            sanitize("see ![map](<https://x/a (1)).png>) here"),
            "see [map] here\n"
        );
        assert_eq!(sanitize("![x](https://x/a.png) (note)"), "[x] (note)\n");
    }

    #[test]
    fn test_links_and_exclamations_survive() {
        let text = "Wow! See [docs](https://example.com/docs).\n";
        assert_eq!(sanitize(text), text);
    }

    #[test]
    fn test_inline_script_removed() {
        assert_eq!(sanitize("a<script>alert(1)</script>b"), "ab\n");
    }

    #[test]
    fn test_multiline_mixed_case_blocks_removed() {
        let raw = "top\n<SCRIPT type=\"text/javascript\">\nvar x = 1;\n</Script >\nmid\n<iframe src=\"https://evil\">\nfallback\n</IFRAME>\nend";
        assert_eq!(sanitize(raw), "top\n\nmid\n\nend\n");
    }

    #[test]
    fn test_blocks_are_removed_independently() {
        let raw = "<script>a</script>keep<script>b</script>";
        assert_eq!(sanitize(raw), "keep\n");
    }

    #[test]
    fn test_stray_tags_removed() {
        assert_eq!(sanitize("x<script src=\"evil.js\">y"), "xy\n");
        assert_eq!(sanitize("x<iframe src=\"a\"/>y"), "xy\n");
    }

    #[test]
    fn test_spliced_tags_removed() {
        assert_eq!(sanitize("<scri<script>pt>alert(1)"), "alert(1)\n");
    }

    #[test]
    fn test_trailing_whitespace_normalized() {
        assert_eq!(sanitize("# Title\n\n\n   \t"), "# Title\n");
        assert_eq!(sanitize("no newline"), "no newline\n");
        assert_eq!(sanitize(""), "\n");
        assert_eq!(sanitize("  indented"), "  indented\n");
    }

    proptest! {
        #[test]
        fn prop_output_ends_with_single_newline(input in ".*") {
            let out = sanitize(&input);
            prop_assert!(out.ends_with('\n'));
            prop_assert!(!out[..out.len() - 1].ends_with(char::is_whitespace));
        }

        #[test]
        fn prop_no_script_tags_survive(input in "(<script>|</script>|<scr|ipt>|<iframe>|[a-z ])*") {
            let out = sanitize(&input).to_ascii_lowercase();
            prop_assert!(!out.contains("<script"));
            prop_assert!(!out.contains("<iframe"));
        }
    }
}
