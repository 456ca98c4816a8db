//! Byte-bounded least-recently-used file cache.
//!
//! # Responsibilities
//! - Keep the most recently touched files in memory up to a byte budget
//! - Evict from the cold end until the budget holds again
//! - Expose cached files as `VirtualFile`s
//!
//! # Design Decisions
//! - `lru::LruCache` supplies the key index and the recency list; both are
//!   only ever touched while holding `inner`, so they cannot drift apart
//! - The cache itself is unbounded by count; the byte budget drives eviction
//! - `get` refreshes recency, `exists` does not

use std::io;
use std::sync::Mutex;

use lru::LruCache;

use crate::cache::file::{CacheFile, VirtualFile};
use crate::observability::metrics;

/// Capacity used when the configured size is zero or unparsable.
pub const DEFAULT_CAPACITY: u64 = 50 * 1024 * 1024;

/// Point-in-time occupancy figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub size: u64,
    pub capacity: u64,
}

struct CacheInner {
    entries: LruCache<String, CacheFile>,
    size: u64,
}

/// Shared file cache keyed by normalized request path.
pub struct FileCache {
    capacity: u64,
    inner: Mutex<CacheInner>,
}

impl FileCache {
    pub fn new(capacity: u64) -> Self {
        let capacity = if capacity == 0 {
            DEFAULT_CAPACITY
        } else {
            capacity
        };

        Self {
            capacity,
            inner: Mutex::new(CacheInner {
                entries: LruCache::unbounded(),
                size: 0,
            }),
        }
    }

    /// Insert or replace `key`, then evict until the byte budget holds.
    ///
    /// Files larger than the entire capacity are ignored; the caller serves
    /// them straight from the source.
    pub fn put(&self, key: impl Into<String>, file: CacheFile) {
        let file_size = file.size();
        if file_size > self.capacity {
            tracing::debug!(
                size = file_size,
                capacity = self.capacity,
                "File exceeds cache capacity, not caching"
            );
            return;
        }

        let mut guard = self.inner.lock().expect("file cache mutex poisoned");
        let inner = &mut *guard;

        // `put` moves an existing key to the head and hands back the old value.
        if let Some(previous) = inner.entries.put(key.into(), file) {
            inner.size = inner.size.saturating_sub(previous.size());
        }
        inner.size += file_size;

        let evicted = Self::evict(inner, self.capacity);
        if evicted > 0 {
            tracing::debug!(evicted, size = inner.size, "Evicted cached files");
        }
        metrics::record_cache_size(inner.size);
    }

    /// Look up `key`, marking it most recently used.
    pub fn get(&self, key: &str) -> Option<CacheFile> {
        let mut inner = self.inner.lock().expect("file cache mutex poisoned");
        inner.entries.get(key).cloned()
    }

    /// Membership check that leaves the recency order untouched.
    pub fn exists(&self, key: &str) -> bool {
        let inner = self.inner.lock().expect("file cache mutex poisoned");
        inner.entries.contains(key)
    }

    /// Open a cached file for reading.
    pub fn open(&self, key: &str) -> io::Result<VirtualFile> {
        self.get(key)
            .map(|file| VirtualFile::new(file.contents, file.meta))
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().expect("file cache mutex poisoned");
        CacheStats {
            entries: inner.entries.len(),
            size: inner.size,
            capacity: self.capacity,
        }
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    fn evict(inner: &mut CacheInner, capacity: u64) -> usize {
        let mut evicted = 0;
        while inner.size > capacity {
            match inner.entries.pop_lru() {
                Some((key, file)) => {
                    inner.size = inner.size.saturating_sub(file.size());
                    tracing::trace!(key = %key, size = file.size(), "Evicting cached file");
                    evicted += 1;
                }
                None => break,
            }
        }
        evicted
    }
}
