//! Finding remote documents referenced by site posts, and guessing where a moved README went.
//!
//! Posts embed remote documents with a Liquid tag:
//!
//! ```text
//! {% remote_markdown https://raw.githubusercontent.com/owner/repo/master/README.md %}
//! ```
//!
//! [`extract_tag_urls`] and [`scan_posts`] collect those URLs so a build can prefetch them.
//! [`readme_alternates`] lists the other places a GitHub README commonly lives when the
//! guessed path returns 404.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::{Result, SourceUrl, validate};

/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static REMOTE_MARKDOWN_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{%-?\s*remote_markdown\s+(\S+?)\s*-?%\}").unwrap());

/// Post file extensions that may contain tags.
const POST_EXTENSIONS: &[&str] = &["md", "markdown", "html"];

const GITHUB_RAW_HOST: &str = "raw.githubusercontent.com";
const README_BRANCHES: &[&str] = &["master", "main", "develop"];
const README_NAMES: &[&str] = &["README.md", "readme.md", "Readme.md"];

/// Extract `remote_markdown` tag arguments in order of first appearance, without duplicates.
///
/// ```rust
/// use mdpull_core::extract_tag_urls;
///
/// let post = "intro\n{% remote_markdown https://example.com/a.md %}\n{%- remote_markdown https://example.com/b.md -%}";
/// assert_eq!(
///     extract_tag_urls(post),
///     vec!["https://example.com/a.md", "https://example.com/b.md"]
/// );
/// ```
#[must_use]
pub fn extract_tag_urls(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    REMOTE_MARKDOWN_TAG_RE
        .captures_iter(text)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Walk `dir` recursively and collect tag URLs from every post file.
///
/// Files are visited in path order so the result is stable between runs; URLs appearing in
/// several posts are reported once.
pub fn scan_posts(dir: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();
    collect_post_files(dir, &mut files)?;
    files.sort();

    let mut seen = HashSet::new();
    let mut urls = Vec::new();
    for file in files {
        let text = fs::read_to_string(&file)?;
        let found = extract_tag_urls(&text);
        debug!(file = %file.display(), count = found.len(), "scanned post");
        for url in found {
            if seen.insert(url.clone()) {
                urls.push(url);
            }
        }
    }
    Ok(urls)
}

fn collect_post_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_post_files(&path, out)?;
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| POST_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        {
            out.push(path);
        }
    }
    Ok(())
}

/// Other likely locations of a GitHub README, for use after `url` returned 404.
///
/// Only applies to `https://raw.githubusercontent.com/<owner>/<repo>/<branch>/<README>` URLs
/// whose file is a README at the repository root; anything else yields no candidates. The
/// candidates try each common branch with each common spelling, skipping `url` itself.
#[must_use]
pub fn readme_alternates(url: &SourceUrl) -> Vec<SourceUrl> {
    let parsed = url.as_url();
    if parsed.host_str() != Some(GITHUB_RAW_HOST) {
        return Vec::new();
    }

    let segments: Vec<&str> = parsed.path().trim_matches('/').split('/').collect();
    let [owner, repo, _branch, file] = segments.as_slice() else {
        return Vec::new();
    };
    if !file.to_ascii_lowercase().starts_with("readme.") {
        return Vec::new();
    }

    README_BRANCHES
        .iter()
        .flat_map(|branch| {
            README_NAMES.iter().map(move |name| {
                format!("https://{GITHUB_RAW_HOST}/{owner}/{repo}/{branch}/{name}")
            })
        })
        .filter(|candidate| candidate != url.as_str())
        .filter_map(|candidate| validate(&candidate).ok())
        .collect()
}
