//! Type definitions for the document cache.

use std::fmt::Write;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::SourceUrl;

/// Durable cache identifier: lowercase hex SHA-256 of the serialized source URL.
///
/// The same URL always produces the same key, so the key doubles as the file stem of both
/// on-disk artifacts.
///
/// ```rust
/// use mdpull_core::{validate, CacheKey};
///
/// let a = CacheKey::from_url(&validate("https://example.com/a.md")?);
/// let again = CacheKey::from_url(&validate("https://example.com/a.md")?);
/// let b = CacheKey::from_url(&validate("https://example.com/b.md")?);
/// assert_eq!(a, again);
/// assert_ne!(a, b);
/// assert_eq!(a.as_str().len(), 64);
/// # Ok::<(), mdpull_core::ValidationError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a validated URL.
    #[must_use]
    pub fn from_url(url: &SourceUrl) -> Self {
        let digest = Sha256::digest(url.as_str().as_bytes());
        let hex = digest.iter().fold(String::with_capacity(64), |mut acc, b| {
            // write! to String is infallible
            let _ = write!(acc, "{b:02x}");
            acc
        });
        Self(hex)
    }

    /// Accept a previously produced key (e.g. a file stem found while sweeping).
    ///
    /// Returns `None` unless `raw` looks like a key this type would have produced.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let valid = raw.len() == 64
            && raw
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then(|| Self(raw.to_string()))
    }

    /// The hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A cached, already sanitized document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Identity of the entry.
    pub key: CacheKey,
    /// Sanitized content.
    pub content: String,
    /// When the content was fetched.
    pub fetched_at: DateTime<Utc>,
    /// URL the content came from.
    pub source_url: String,
}

impl CacheEntry {
    /// Build an entry for `url`, deriving its key.
    #[must_use]
    pub fn new(url: &SourceUrl, content: String, fetched_at: DateTime<Utc>) -> Self {
        Self {
            key: CacheKey::from_url(url),
            content,
            fetched_at,
            source_url: url.to_string(),
        }
    }

    /// `true` while `now - fetched_at < ttl`.
    #[must_use]
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        is_within_ttl(self.fetched_at, ttl, now)
    }

    pub(crate) fn metadata(&self) -> CacheMetadata {
        CacheMetadata {
            key: self.key.clone(),
            source_url: self.source_url.clone(),
            fetched_at: self.fetched_at,
            content_length: self.content.len(),
        }
    }
}

pub(crate) fn is_within_ttl(fetched_at: DateTime<Utc>, ttl: Duration, now: DateTime<Utc>) -> bool {
    // A TTL too large for TimeDelta never expires.
    let Ok(ttl) = TimeDelta::from_std(ttl) else {
        return true;
    };
    now - fetched_at < ttl
}

/// On-disk metadata companion of a content file.
///
/// `content_length` lets a reader notice a content file that was replaced without its
/// metadata (a crash between the two renames) and treat the pair as a miss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CacheMetadata {
    pub key: CacheKey,
    pub source_url: String,
    pub fetched_at: DateTime<Utc>,
    pub content_length: usize,
}
