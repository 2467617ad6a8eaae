//! Cache Statistics Module
//!
//! Tracks store traffic (hits, misses, evictions) and load coordination
//! counters (fills, failures, discarded commits, coalesced waits).

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time snapshot of cache metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Store lookups that returned a live value
    pub hits: u64,
    /// Store lookups that found nothing or an expired entry
    pub misses: u64,
    /// Entries evicted due to LRU policy
    pub evictions: u64,
    /// Current number of entries in the store
    pub total_entries: usize,
    /// Loader invocations
    pub loads: u64,
    /// Loader invocations that returned an error
    pub load_failures: u64,
    /// Successful loads not committed because the key was deleted mid-fill
    pub discarded_fills: u64,
    /// Times a caller waited on another caller's in-flight fill
    pub coalesced_waits: u64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}

// == Load Counters ==
/// Lock-free counters maintained by the load coordinator.
#[derive(Debug, Default)]
pub(crate) struct LoadCounters {
    loads: AtomicU64,
    load_failures: AtomicU64,
    discarded_fills: AtomicU64,
    coalesced_waits: AtomicU64,
}

impl LoadCounters {
    pub(crate) fn record_load(&self) {
        self.loads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.load_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_discard(&self) {
        self.discarded_fills.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_wait(&self) {
        self.coalesced_waits.fetch_add(1, Ordering::Relaxed);
    }

    /// Copies the counters into a store-level snapshot.
    pub(crate) fn fill(&self, stats: &mut CacheStats) {
        stats.loads = self.loads.load(Ordering::Relaxed);
        stats.load_failures = self.load_failures.load(Ordering::Relaxed);
        stats.discarded_fills = self.discarded_fills.load(Ordering::Relaxed);
        stats.coalesced_waits = self.coalesced_waits.load(Ordering::Relaxed);
    }
}
