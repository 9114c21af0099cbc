//! The placeholder rendered in place of a document that could not be fetched.

use html_escape::{encode_double_quoted_attribute, encode_text};

/// CSS class on the placeholder container, for site stylesheets to target.
pub const ERROR_FRAGMENT_CLASS: &str = "remote-markdown-error";

/// Render an embeddable HTML placeholder naming the failed URL and the reason.
///
/// Both inputs are escaped, so a hostile URL or server message cannot break out of the
/// container.
///
/// ```rust
/// use mdpull_core::error_fragment;
///
/// let html = error_fragment("https://example.com/a.md", "HTTP 500: Internal Server Error");
/// assert!(html.starts_with("<div class=\"remote-markdown-error\""));
/// assert!(html.contains("https://example.com/a.md"));
/// assert!(html.contains("HTTP 500"));
/// ```
#[must_use]
pub fn error_fragment(url: &str, reason: &str) -> String {
    let attr_url = encode_double_quoted_attribute(url);
    let text_url = encode_text(url);
    let reason = encode_text(reason);
    format!(
        "<div class=\"{ERROR_FRAGMENT_CLASS}\" data-url=\"{attr_url}\">\n\
         <p>Failed to fetch remote markdown from <a href=\"{attr_url}\">{text_url}</a></p>\n\
         <p class=\"reason\">{reason}</p>\n\
         </div>\n"
    )
}
