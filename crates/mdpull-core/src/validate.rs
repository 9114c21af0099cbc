//! Candidate URL validation.
//!
//! Everything that reaches the network goes through [`validate`] first, so a typo in a post
//! costs nothing more than a string comparison.

use std::fmt;

use url::Url;

use crate::ValidationError;

/// Schemes a remote document may be fetched over.
pub const ALLOWED_SCHEMES: &[&str] = &["http", "https"];

/// Recognized markdown file extensions, lowercase and dot-prefixed.
pub const MARKDOWN_EXTENSIONS: &[&str] = &[".markdown", ".mkdown", ".mkdn", ".mkd", ".md"];

/// An absolute HTTP(S) URL whose path ends in a markdown extension.
///
/// Only obtainable through [`validate`] (or [`SourceUrl::from_url`], which applies the same
/// checks), so holding one means the checks have passed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceUrl(Url);

impl SourceUrl {
    /// Validate an already-parsed URL.
    pub fn from_url(url: Url) -> Result<Self, ValidationError> {
        let scheme = url.scheme();
        if !ALLOWED_SCHEMES.contains(&scheme) {
            return Err(ValidationError::UnsupportedScheme {
                scheme: scheme.to_string(),
            });
        }

        if !has_markdown_extension(url.path()) {
            return Err(ValidationError::UnsupportedExtension {
                path: url.path().to_string(),
            });
        }

        Ok(Self(url))
    }

    /// The underlying parsed URL.
    pub const fn as_url(&self) -> &Url {
        &self.0
    }

    /// The serialized URL.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for SourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Validate a raw candidate URL.
///
/// Surrounding whitespace is ignored, matching how URLs appear inside template tags.
///
/// ```rust
/// use mdpull_core::{validate, ValidationError};
///
/// let url = validate(" https://example.com/docs/README.md ")?;
/// assert_eq!(url.as_str(), "https://example.com/docs/README.md");
///
/// assert!(matches!(
///     validate("ftp://example.com/README.md"),
///     Err(ValidationError::UnsupportedScheme { .. })
/// ));
/// # Ok::<(), mdpull_core::ValidationError>(())
/// ```
pub fn validate(raw: &str) -> Result<SourceUrl, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyInput);
    }

    let url = Url::parse(trimmed).map_err(|e| ValidationError::MalformedUri {
        input: trimmed.to_string(),
        reason: e.to_string(),
    })?;

    SourceUrl::from_url(url)
}

fn has_markdown_extension(path: &str) -> bool {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let Some(dot) = file_name.rfind('.') else {
        return false;
    };
    // A leading dot is a hidden file, not an extension.
    if dot == 0 {
        return false;
    }
    let ext = file_name[dot..].to_ascii_lowercase();
    MARKDOWN_EXTENSIONS.contains(&ext.as_str())
}
