//! Error types and handling for mdpull-core operations.
//!
//! Failures are split by the layer that produces them:
//!
//! - [`ValidationError`]: the caller handed us something that is not a remote markdown URL.
//!   Reported immediately, never retried.
//! - [`FetchError`]: the network or the remote server let us down. Only transport-level
//!   failures are retried; everything else is terminal.
//! - [`CacheError`]: the on-disk cache could not be read or written. Always non-fatal, the
//!   resolver treats it as a miss (reads) or logs and moves on (writes).
//!
//! All three convert into the crate-wide [`Error`], which is what fallible setup code
//! (configuration loading, client construction, sweeping) returns. The resolver itself never
//! returns any of these to its caller; it renders them into an error fragment instead.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for mdpull-core operations.
///
/// Keeps the full source chain so `Debug` output includes the underlying cause, while
/// `Display` stays short enough to show to a site author.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed outside the cache layer (e.g. scanning a posts directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The HTTP client could not be constructed.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Configuration is invalid or inaccessible.
    ///
    /// ## Common Causes
    ///
    /// - Invalid TOML syntax in the config file
    /// - Values that cannot be represented (e.g. a TTL that overflows)
    /// - Environment overrides that do not parse as numbers
    #[error("Configuration error: {0}")]
    Config(String),

    /// A candidate URL was rejected before any network activity.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Fetching a remote document failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The cache store failed.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl Error {
    /// Check if the error might go away if the operation is retried later.
    ///
    /// Exhausted retries count as recoverable: the transport kept failing, which usually
    /// means the remote host or the network is having a bad moment, not that the URL is wrong.
    ///
    /// ```rust
    /// use mdpull_core::{Error, FetchError, ValidationError};
    ///
    /// let flaky = Error::Fetch(FetchError::ExhaustedRetries {
    ///     url: "https://example.com/README.md".to_string(),
    ///     attempts: 3,
    ///     last_error: "connection reset".to_string(),
    /// });
    /// assert!(flaky.is_recoverable());
    ///
    /// let wrong = Error::Validation(ValidationError::EmptyInput);
    /// assert!(!wrong.is_recoverable());
    /// ```
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::Fetch(e) => e.is_recoverable(),
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
            ),
            Self::Cache(_) => true,
            _ => false,
        }
    }

    /// Get the error category as a string identifier for logging.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Network(_) => "network",
            Self::Config(_) => "config",
            Self::Validation(_) => "validation",
            Self::Fetch(_) => "fetch",
            Self::Cache(_) => "cache",
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons a candidate URL is rejected before any network activity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The input was empty or only whitespace.
    #[error("remote_markdown: no URL given")]
    EmptyInput,

    /// The input could not be parsed as an absolute URI.
    #[error("remote_markdown: invalid URI given {input}: {reason}")]
    MalformedUri {
        /// The offending input, trimmed.
        input: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// The URI scheme is not `http` or `https`.
    #[error("remote_markdown: unsupported scheme '{scheme}' (expected http or https)")]
    UnsupportedScheme {
        /// The scheme that was found.
        scheme: String,
    },

    /// The URI path does not end in a recognized markdown extension.
    #[error(
        "remote_markdown: URI file extension of '{path}' not in [.markdown, .mkdown, .mkdn, .mkd, .md]"
    )]
    UnsupportedExtension {
        /// The URI path that was checked.
        path: String,
    },
}

/// Terminal outcomes of a fetch.
///
/// Each variant renders (via `Display`) into the human-readable reason embedded in the
/// error fragment, so the messages are written for site authors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request did not complete within the fetch timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// URL being fetched when the timeout fired.
        url: String,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },

    /// The server answered 404. Kept apart from [`FetchError::Http`] because the fix is
    /// different: the document moved, so the URL in the post needs updating.
    #[error("no document found at {url} (HTTP 404)")]
    NotFound {
        /// URL that returned 404 (after following a redirect, if any).
        url: String,
    },

    /// The server answered with a non-success status other than 404.
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Reason phrase or diagnostic.
        message: String,
    },

    /// More than one redirect hop was required.
    #[error("too many redirects while fetching {url} (at most {max_hops} hop allowed)")]
    TooManyRedirects {
        /// Original URL of the request.
        url: String,
        /// Number of hops that are allowed.
        max_hops: u32,
    },

    /// Transport-level failures persisted across every attempt.
    #[error("giving up on {url} after {attempts} attempts: {last_error}")]
    ExhaustedRetries {
        /// URL being fetched.
        url: String,
        /// Number of attempts made.
        attempts: u32,
        /// Diagnostic from the final attempt.
        last_error: String,
    },
}

impl FetchError {
    /// Whether a later build could plausibly succeed without anyone editing the URL.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::ExhaustedRetries { .. } => true,
            Self::Http { status, .. } => *status >= 500,
            Self::NotFound { .. } | Self::TooManyRedirects { .. } => false,
        }
    }

    /// Short machine-friendly name for logs and JSON output.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::NotFound { .. } => "not_found",
            Self::Http { .. } => "http",
            Self::TooManyRedirects { .. } => "too_many_redirects",
            Self::ExhaustedRetries { .. } => "exhausted_retries",
        }
    }
}

/// Failures of the cache store. Never fatal to content resolution.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Reading or writing a cache artifact failed.
    #[error("cache I/O error at {}: {source}", path.display())]
    Io {
        /// Path of the artifact involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Metadata could not be encoded for writing.
    #[error("cache serialization error: {0}")]
    Serialization(String),
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
