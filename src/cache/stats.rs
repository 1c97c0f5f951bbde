//! Cache Statistics Module
//!
//! Lookup outcomes and byte-budget usage of one [`CacheStore`](super::CacheStore).

use serde::Serialize;

// == Cache Stats ==
/// Counters kept under the store's lock, plus usage filled in on snapshot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries dropped to get back under the byte budget
    pub evictions: u64,
    pub total_entries: usize,
    /// Bytes held, keys plus values
    pub total_bytes: usize,
    pub max_bytes: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fraction of lookups that hit, 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        match self.hits + self.misses {
            0 => 0.0,
            lookups => self.hits as f64 / lookups as f64,
        }
    }

    /// Fraction of the byte budget in use, 0.0 for a zero budget.
    pub fn budget_used(&self) -> f64 {
        match self.max_bytes {
            0 => 0.0,
            max => self.total_bytes as f64 / max as f64,
        }
    }

    pub fn record_lookup(&mut self, hit: bool) {
        if hit {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
    }

    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }

    /// Returns these counters with the current usage attached.
    pub fn with_usage(mut self, entries: usize, bytes: usize, max_bytes: usize) -> Self {
        self.total_entries = entries;
        self.total_bytes = bytes;
        self.max_bytes = max_bytes;
        self
    }
}
