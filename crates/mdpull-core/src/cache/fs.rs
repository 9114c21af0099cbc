//! Filesystem-backed cache store.
//!
//! ## Storage Layout
//!
//! ```text
//! <cache_dir>/
//!   3f9a…e1.md      # Sanitized content
//!   3f9a…e1.json    # Metadata: key, sourceUrl, fetchedAt, contentLength
//! ```
//!
//! Both artifacts are named by the [`CacheKey`] so they can be correlated and swept
//! together. Each is written to a temp file in the same directory and renamed into place;
//! content goes first, so the presence of metadata implies the presence of content.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::CacheError;
use crate::cache::types::{CacheMetadata, is_within_ttl};
use crate::cache::{CacheEntry, CacheKey, CacheStore};

const CONTENT_EXT: &str = "md";
const METADATA_EXT: &str = "json";

/// Cache store rooted at a dedicated directory.
///
/// The directory is created on the first write; reads and sweeps against a missing
/// directory simply find nothing.
#[derive(Debug, Clone)]
pub struct FsCacheStore {
    root: PathBuf,
}

impl FsCacheStore {
    /// Create a store rooted at `root`. Nothing touches the filesystem until first use.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn content_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(format!("{key}.{CONTENT_EXT}"))
    }

    fn metadata_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(format!("{key}.{METADATA_EXT}"))
    }

    fn read_metadata(&self, key: &CacheKey) -> Result<Option<CacheMetadata>, CacheError> {
        let path = self.metadata_path(key);
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::io(path, e)),
        };

        match serde_json::from_slice::<CacheMetadata>(&raw) {
            Ok(meta) if meta.key == *key => Ok(Some(meta)),
            Ok(meta) => {
                warn!(expected = %key, found = %meta.key, "cache metadata key mismatch");
                Ok(None)
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt cache metadata");
                Ok(None)
            },
        }
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
        let mut tmp = NamedTempFile::new_in(&self.root).map_err(|e| CacheError::io(&self.root, e))?;
        tmp.write_all(bytes)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| CacheError::io(tmp.path(), e))?;
        tmp.persist(path)
            .map_err(|e| CacheError::io(path, e.error))?;
        Ok(())
    }

    fn remove_if_present(path: &Path) -> Result<(), CacheError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::io(path, e)),
        }
    }

    fn remove_entry(&self, key: &CacheKey) -> Result<(), CacheError> {
        // Metadata first: a reader that still sees metadata must also find content.
        Self::remove_if_present(&self.metadata_path(key))?;
        Self::remove_if_present(&self.content_path(key))
    }

    fn is_stale_orphan(path: &Path, ttl: Duration, now: DateTime<Utc>) -> bool {
        let age = fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| SystemTime::from(now).duration_since(modified).ok());
        age.is_some_and(|age| age >= ttl)
    }

    /// Keys that have at least one artifact on disk, split by whether metadata exists.
    fn scan_keys(&self) -> Result<(Vec<CacheKey>, Vec<CacheKey>), CacheError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok((Vec::new(), Vec::new())),
            Err(e) => return Err(CacheError::io(&self.root, e)),
        };

        let mut with_metadata = Vec::new();
        let mut content_only = Vec::new();
        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    warn!(
                        root = %self.root.display(),
                        error = %e,
                        "skipping unreadable cache directory entry"
                    );
                    continue;
                },
            };
            let (Some(stem), Some(ext)) = (
                path.file_stem().and_then(|s| s.to_str()),
                path.extension().and_then(|s| s.to_str()),
            ) else {
                continue;
            };
            let Some(key) = CacheKey::parse(stem) else {
                continue;
            };
            match ext {
                METADATA_EXT => with_metadata.push(key),
                CONTENT_EXT if !self.metadata_path(&key).exists() => content_only.push(key),
                _ => {},
            }
        }
        Ok((with_metadata, content_only))
    }
}

impl CacheStore for FsCacheStore {
    fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        let Some(meta) = self.read_metadata(key)? else {
            return Ok(None);
        };

        let path = self.content_path(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(%key, "cache metadata without content");
                return Ok(None);
            },
            Err(e) => return Err(CacheError::io(path, e)),
        };

        if bytes.len() != meta.content_length {
            warn!(
                %key,
                expected = meta.content_length,
                found = bytes.len(),
                "cache content length mismatch"
            );
            return Ok(None);
        }

        let Ok(content) = String::from_utf8(bytes) else {
            warn!(%key, "cache content is not valid UTF-8");
            return Ok(None);
        };

        Ok(Some(CacheEntry {
            key: meta.key,
            content,
            fetched_at: meta.fetched_at,
            source_url: meta.source_url,
        }))
    }

    fn put(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        fs::create_dir_all(&self.root).map_err(|e| CacheError::io(&self.root, e))?;

        let metadata = serde_json::to_vec_pretty(&entry.metadata())
            .map_err(|e| CacheError::Serialization(e.to_string()))?;

        self.write_atomic(&self.content_path(&entry.key), entry.content.as_bytes())?;
        self.write_atomic(&self.metadata_path(&entry.key), &metadata)?;

        debug!(key = %entry.key, url = %entry.source_url, "cached document");
        Ok(())
    }

    fn sweep(&self, ttl: Duration, now: DateTime<Utc>) -> Result<usize, CacheError> {
        let (with_metadata, content_only) = self.scan_keys()?;
        let mut removed = 0;

        for key in with_metadata {
            let expired = match self.read_metadata(&key) {
                Ok(Some(meta)) => !is_within_ttl(meta.fetched_at, ttl, now),
                // Unparseable metadata can never produce a hit.
                Ok(None) => true,
                Err(e) => {
                    warn!(%key, error = %e, "skipping unreadable cache entry");
                    continue;
                },
            };
            if !expired {
                continue;
            }
            match self.remove_entry(&key) {
                Ok(()) => {
                    debug!(%key, "swept cache entry");
                    removed += 1;
                },
                Err(e) => warn!(%key, error = %e, "failed to remove cache entry"),
            }
        }

        // Content without metadata is either a put in progress or debris from a crash.
        // Only the latter is old enough to be past the TTL.
        for key in content_only {
            let path = self.content_path(&key);
            if !Self::is_stale_orphan(&path, ttl, now) {
                continue;
            }
            match Self::remove_if_present(&path) {
                Ok(()) => {
                    debug!(%key, "swept orphaned cache content");
                    removed += 1;
                },
                Err(e) => warn!(%key, error = %e, "failed to remove orphaned cache content"),
            }
        }

        Ok(removed)
    }
}
