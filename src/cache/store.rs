//! Cache Store Module
//!
//! Thread-safe wrapper pairing the byte-budgeted LRU with hit/miss statistics.

use parking_lot::Mutex;

use crate::cache::{ByteView, CacheStats, LruCache};

// == Cache Store ==
/// Per-group cache of [`ByteView`] values.
///
/// Every operation takes the same exclusive lock: lookups reorder the
/// recency list, so there is no read-only path.
#[derive(Debug)]
pub struct CacheStore {
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    /// Byte-budgeted storage
    lru: LruCache<ByteView>,
    /// Performance statistics
    stats: CacheStats,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore with the given byte budget.
    ///
    /// # Arguments
    /// * `max_bytes` - Total bytes (keys plus values) the cache may hold
    pub fn new(max_bytes: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                lru: LruCache::new(max_bytes),
                stats: CacheStats::new(),
            }),
        }
    }

    // == Get ==
    /// Retrieves a value by key, marking it most recently used.
    pub fn get(&self, key: &str) -> Option<ByteView> {
        let mut inner = self.inner.lock();
        let value = inner.lru.get(key).cloned();
        inner.stats.record_lookup(value.is_some());
        value
    }

    // == Add ==
    /// Stores a value, evicting least recently used entries past the budget.
    pub fn add(&self, key: &str, value: ByteView) {
        let mut inner = self.inner.lock();
        let evicted = inner.lru.add(key, value);
        inner.stats.record_evictions(evicted);
    }

    // == Remove ==
    /// Removes an entry by key. Returns false if it was absent.
    pub fn remove(&self, key: &str) -> bool {
        self.inner.lock().lru.remove(key)
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        inner
            .stats
            .clone()
            .with_usage(inner.lru.len(), inner.lru.used_bytes(), inner.lru.max_bytes())
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.inner.lock().lru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().lru.is_empty()
    }

    /// Returns the bytes currently held.
    pub fn used_bytes(&self) -> usize {
        self.inner.lock().lru.used_bytes()
    }
}
