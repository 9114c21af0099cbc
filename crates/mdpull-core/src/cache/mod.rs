//! Document cache keyed by source URL.
//!
//! ## Key Types
//!
//! - [`CacheKey`]: Durable identifier derived from the source URL (SHA-256 hex)
//! - [`CacheEntry`]: Sanitized content plus the time it was fetched
//! - [`CacheStore`]: Storage seam, implemented by [`FsCacheStore`] for builds and
//!   [`MemoryCacheStore`] for tests and one-off runs
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use chrono::Utc;
//! use mdpull_core::{validate, CacheEntry, CacheStore, MemoryCacheStore};
//!
//! let store = MemoryCacheStore::new();
//! let url = validate("https://example.com/README.md")?;
//! let entry = CacheEntry::new(&url, "# Hello\n".to_string(), Utc::now());
//! store.put(&entry)?;
//!
//! let cached = store.get(&entry.key)?.expect("entry was just written");
//! assert!(cached.is_fresh(Duration::from_secs(60), Utc::now()));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod fs;
mod store;
mod types;

pub use fs::FsCacheStore;
pub use store::{CacheStore, MemoryCacheStore};
pub use types::{CacheEntry, CacheKey};
