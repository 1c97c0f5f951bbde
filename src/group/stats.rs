//! Group Statistics Module
//!
//! Lock-free counters describing how a group served its lookups.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Group Stats ==
/// Per-group counters, updated concurrently by every caller.
#[derive(Debug, Default)]
pub struct GroupStats {
    gets: AtomicU64,
    cache_hits: AtomicU64,
    peer_loads: AtomicU64,
    peer_errors: AtomicU64,
    loads: AtomicU64,
    local_loads: AtomicU64,
    local_load_errors: AtomicU64,
    server_requests: AtomicU64,
}

/// Point-in-time copy of [`GroupStats`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupStatsSnapshot {
    /// Lookups with a non-empty key
    pub gets: u64,
    /// Lookups served from the local cache
    pub cache_hits: u64,
    /// Values fetched from the owning peer
    pub peer_loads: u64,
    /// Failed peer fetches that fell back to the loader
    pub peer_errors: u64,
    /// Loads actually executed after deduplication
    pub loads: u64,
    /// Successful loader invocations
    pub local_loads: u64,
    /// Failed loader invocations
    pub local_load_errors: u64,
    /// Lookups that arrived from other peers
    pub server_requests: u64,
}

fn incr(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl GroupStats {
    pub fn record_get(&self) {
        incr(&self.gets);
    }

    pub fn record_cache_hit(&self) {
        incr(&self.cache_hits);
    }

    pub fn record_peer_load(&self) {
        incr(&self.peer_loads);
    }

    pub fn record_peer_error(&self) {
        incr(&self.peer_errors);
    }

    pub fn record_load(&self) {
        incr(&self.loads);
    }

    pub fn record_local_load(&self) {
        incr(&self.local_loads);
    }

    pub fn record_local_load_error(&self) {
        incr(&self.local_load_errors);
    }

    pub fn record_server_request(&self) {
        incr(&self.server_requests);
    }

    // == Snapshot ==
    /// Reads every counter.
    pub fn snapshot(&self) -> GroupStatsSnapshot {
        GroupStatsSnapshot {
            gets: self.gets.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            peer_loads: self.peer_loads.load(Ordering::Relaxed),
            peer_errors: self.peer_errors.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            local_loads: self.local_loads.load(Ordering::Relaxed),
            local_load_errors: self.local_load_errors.load(Ordering::Relaxed),
            server_requests: self.server_requests.load(Ordering::Relaxed),
        }
    }
}
