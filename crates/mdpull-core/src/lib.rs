//! # mdpull-core
//!
//! Core functionality for mdpull - embedding remote markdown documents into statically
//! generated pages.
//!
//! A post names a remote document with a URL; the build needs its text. This crate validates
//! the URL, serves it from an on-disk cache while the cached copy is fresh, otherwise fetches
//! it (one redirect hop, bounded linear retry), strips what must not be embedded, and renders
//! an HTML placeholder when anything goes wrong. A failed document never fails the build.
//!
//! ## Architecture
//!
//! - **Validation**: [`validate`] accepts absolute `http`/`https` URLs to markdown files
//! - **Cache**: [`CacheStore`] keyed by the SHA-256 of the URL, with a filesystem and an
//!   in-memory implementation
//! - **Fetching**: [`Fetcher`] over a pluggable [`HttpTransport`]
//! - **Sanitizing**: [`sanitize`] removes script and iframe blocks and neutralizes images
//! - **Resolving**: [`Resolver`] composes the above and never returns an error
//!
//! ## Quick Start
//!
//! ```rust
//! use mdpull_core::{CacheKey, sanitize, validate};
//!
//! let url = validate("https://raw.githubusercontent.com/o/r/master/README.md")?;
//! let key = CacheKey::from_url(&url);
//! assert_eq!(key.as_str().len(), 64);
//!
//! let clean = sanitize("# Title\n![badge](https://img.shields.io/x.svg)\n<script>x()</script>");
//! assert_eq!(clean, "# Title\n[badge]\n");
//! # Ok::<(), mdpull_core::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! Fallible operations return [`Result<T, Error>`]. [`Resolver::resolve`] is the exception: it
//! folds every failure into [`FetchResult::Failed`] so the page can still be built.
//!
//! ```rust
//! use mdpull_core::{Error, ValidationError, validate};
//!
//! match validate("ftp://example.com/README.md").map_err(Error::from) {
//!     Err(Error::Validation(ValidationError::UnsupportedScheme { scheme })) => {
//!         assert_eq!(scheme, "ftp");
//!     },
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

/// On-disk and in-memory document cache
pub mod cache;
/// Injectable time source
pub mod clock;
/// Configuration loading and defaults
pub mod config;
/// Tag scanning and README relocation candidates
pub mod discovery;
/// Error types and result aliases
pub mod error;
/// Retrying, redirect-limited HTTP fetching
pub mod fetcher;
/// Error placeholder rendering
pub mod render;
/// Cache-first resolution of remote documents
pub mod resolver;
/// Markdown sanitizing
pub mod sanitize;
/// HTTP transport seam
pub mod transport;
/// URL validation
pub mod validate;

// Re-export commonly used types
pub use cache::{CacheEntry, CacheKey, CacheStore, FsCacheStore, MemoryCacheStore};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, Config, FetchConfig};
pub use discovery::{extract_tag_urls, readme_alternates, scan_posts};
pub use error::{CacheError, Error, FetchError, Result, ValidationError};
pub use fetcher::{Fetcher, RetryPolicy};
pub use render::error_fragment;
pub use resolver::{FetchResult, Resolver};
pub use sanitize::sanitize;
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport, TransportError};
pub use validate::{SourceUrl, validate};
