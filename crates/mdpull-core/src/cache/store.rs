//! The cache store seam and its in-memory implementation.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::CacheError;
use crate::cache::{CacheEntry, CacheKey};

/// Persistent key-value storage for fetched documents.
///
/// Implementations must tolerate concurrent callers. Writes for the same key may race;
/// the last write wins.
pub trait CacheStore: Send + Sync {
    /// Load the entry for `key`.
    ///
    /// Absent or structurally invalid entries are `Ok(None)`. `Err` is reserved for the
    /// store itself being unreadable; callers treat it as a miss as well.
    fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError>;

    /// Insert or replace the entry for `entry.key`.
    ///
    /// A concurrent reader must never observe partially written content.
    fn put(&self, entry: &CacheEntry) -> Result<(), CacheError>;

    /// Delete every entry for which `now - fetched_at >= ttl`, returning how many were removed.
    fn sweep(&self, ttl: Duration, now: DateTime<Utc>) -> Result<usize, CacheError>;
}

/// A `HashMap`-backed store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl MemoryCacheStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// `true` when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        Ok(self.lock().get(key).cloned())
    }

    fn put(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        self.lock().insert(entry.key.clone(), entry.clone());
        Ok(())
    }

    fn sweep(&self, ttl: Duration, now: DateTime<Utc>) -> Result<usize, CacheError> {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh(ttl, now));
        Ok(before - entries.len())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::validate;
    use chrono::TimeDelta;

    fn entry(url: &str, fetched_at: DateTime<Utc>) -> CacheEntry {
        CacheEntry::new(&validate(url).unwrap(), format!("content of {url}\n"), fetched_at)
    }

    #[test]
    fn test_put_replaces_existing_entry() {
        let store = MemoryCacheStore::new();
        let now = Utc::now();
        let mut first = entry("https://example.com/a.md", now);
        store.put(&first).unwrap();

        first.content = "updated\n".to_string();
        store.put(&first).unwrap();

        assert_eq!(store.len(), 1);
        let loaded = store.get(&first.key).unwrap().unwrap();
        assert_eq!(loaded.content, "updated\n");
    }

    #[test]
    fn test_sweep_removes_only_stale_entries() {
        let store = MemoryCacheStore::new();
        let now = Utc::now();
        let ttl = Duration::from_secs(3600);
        let fresh = entry("https://example.com/fresh.md", now - TimeDelta::seconds(10));
        let stale = entry("https://example.com/stale.md", now - TimeDelta::seconds(3600));
        store.put(&fresh).unwrap();
        store.put(&stale).unwrap();

        assert_eq!(store.sweep(ttl, now).unwrap(), 1);
        assert!(store.get(&fresh.key).unwrap().is_some());
        assert!(store.get(&stale.key).unwrap().is_none());

        // Idempotent
        assert_eq!(store.sweep(ttl, now).unwrap(), 0);
    }
}
