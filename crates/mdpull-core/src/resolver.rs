//! Resolving a candidate URL to embeddable text.
//!
//! [`Resolver::resolve`] is the one entry point the page generator needs: it validates,
//! serves from cache while fresh, otherwise fetches and sanitizes, and turns every failure
//! into an error fragment. It never returns an error.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::{CacheEntry, CacheKey, CacheStore, FsCacheStore};
use crate::clock::{Clock, SystemClock};
use crate::config::{Config, DEFAULT_TTL};
use crate::discovery::readme_alternates;
use crate::{FetchError, Fetcher, Result, SourceUrl, error_fragment, sanitize, validate};

/// What [`Resolver::resolve`] hands back. Always renderable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchResult {
    /// Served from a fresh cache entry; no network request was made.
    Hit {
        /// Sanitized content.
        content: String,
    },
    /// Fetched, sanitized and written to the cache.
    Fetched {
        /// Sanitized content.
        content: String,
    },
    /// Validation or fetching failed; `fragment` is the placeholder to embed.
    Failed {
        /// The URL as given (trimmed) or as validated.
        url: String,
        /// Human-readable reason.
        reason: String,
        /// HTML placeholder naming `url` and `reason`.
        fragment: String,
    },
}

impl FetchResult {
    fn failed(url: &str, reason: String) -> Self {
        Self::Failed {
            fragment: error_fragment(url, &reason),
            url: url.to_string(),
            reason,
        }
    }

    /// The text to embed: content on success, the fragment on failure.
    pub fn text(&self) -> &str {
        match self {
            Self::Hit { content } | Self::Fetched { content } => content,
            Self::Failed { fragment, .. } => fragment,
        }
    }

    /// `true` for [`FetchResult::Failed`].
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// `"hit"`, `"fetched"` or `"failed"`.
    pub const fn status(&self) -> &'static str {
        match self {
            Self::Hit { .. } => "hit",
            Self::Fetched { .. } => "fetched",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Composes validation, cache, fetcher and sanitizer.
///
/// Cheap to share behind an `Arc`; every call is independent apart from the cache store.
pub struct Resolver {
    store: Arc<dyn CacheStore>,
    fetcher: Fetcher,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    readme_fallback: bool,
}

impl Resolver {
    /// A resolver over the given store and fetcher, with wall-clock time, the default TTL and
    /// README fallback enabled.
    pub fn new(store: Arc<dyn CacheStore>, fetcher: Fetcher) -> Self {
        Self {
            store,
            fetcher,
            clock: Arc::new(SystemClock),
            ttl: DEFAULT_TTL,
            readme_fallback: true,
        }
    }

    /// A resolver with an on-disk cache and a `reqwest` fetcher built from `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = Arc::new(FsCacheStore::new(&config.cache.dir));
        let fetcher = Fetcher::from_config(&config.fetch)?;
        Ok(Self::new(store, fetcher)
            .with_ttl(config.cache.ttl())
            .with_readme_fallback(config.fetch.readme_fallback))
    }

    /// Replace the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the TTL.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Enable or disable alternate-README probing after a 404.
    #[must_use]
    pub const fn with_readme_fallback(mut self, enabled: bool) -> Self {
        self.readme_fallback = enabled;
        self
    }

    /// The TTL in effect.
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Resolve `raw_url` to embeddable text.
    ///
    /// Fresh cache entries are returned without touching the network. Failures are logged and
    /// rendered as an error fragment; they are never cached.
    pub async fn resolve(&self, raw_url: &str) -> FetchResult {
        info!("download >> {}", raw_url.trim());

        let url = match validate(raw_url) {
            Ok(url) => url,
            Err(err) => {
                warn!(url = raw_url.trim(), error = %err, "rejected remote markdown URL");
                return FetchResult::failed(raw_url.trim(), err.to_string());
            },
        };

        let key = CacheKey::from_url(&url);
        if let Some(content) = self.cached(&key) {
            debug!(%url, %key, "cache hit");
            return FetchResult::Hit { content };
        }

        match self.fetch_with_fallback(&url).await {
            Ok(body) => {
                let content = sanitize(&body);
                let entry = CacheEntry::new(&url, content, self.clock.now());
                if let Err(err) = self.store.put(&entry) {
                    warn!(%url, %key, error = %err, "failed to write cache entry");
                }
                FetchResult::Fetched {
                    content: entry.content,
                }
            },
            Err(err) => {
                warn!(%url, kind = err.kind(), error = %err, "failed to fetch remote markdown");
                FetchResult::failed(url.as_str(), err.to_string())
            },
        }
    }

    /// Validate and fetch `raw_url`, bypassing the cache entirely. Returns the raw body.
    pub async fn check(&self, raw_url: &str) -> Result<String> {
        let url = validate(raw_url)?;
        Ok(self.fetcher.fetch(&url).await?)
    }

    /// Delete cache entries older than the TTL.
    pub fn sweep(&self) -> Result<usize> {
        let removed = self.store.sweep(self.ttl, self.clock.now())?;
        info!(removed, "swept stale cache entries");
        Ok(removed)
    }

    fn cached(&self, key: &CacheKey) -> Option<String> {
        match self.store.get(key) {
            Ok(Some(entry)) if entry.is_fresh(self.ttl, self.clock.now()) => Some(entry.content),
            Ok(Some(entry)) => {
                debug!(%key, fetched_at = %entry.fetched_at, "cache entry stale");
                None
            },
            Ok(None) => None,
            Err(err) => {
                warn!(%key, error = %err, "cache read failed, treating as miss");
                None
            },
        }
    }

    async fn fetch_with_fallback(&self, url: &SourceUrl) -> std::result::Result<String, FetchError> {
        match self.fetcher.fetch(url).await {
            Err(not_found @ FetchError::NotFound { .. }) if self.readme_fallback => {
                for candidate in readme_alternates(url) {
                    match self.fetcher.fetch(&candidate).await {
                        Ok(body) => {
                            info!(%url, found = %candidate, "README found at alternate location");
                            return Ok(body);
                        },
                        Err(err) => debug!(candidate = %candidate, error = %err, "alternate README missed"),
                    }
                }
                Err(not_found)
            },
            other => other,
        }
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("fetcher", &self.fetcher)
            .field("ttl", &self.ttl)
            .field("readme_fallback", &self.readme_fallback)
            .finish_non_exhaustive()
    }
}
