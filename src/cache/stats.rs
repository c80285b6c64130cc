//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, and evictions.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of cache performance and occupancy.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of `get` calls that found their key
    pub hits: u64,
    /// Number of `get` calls that missed
    pub misses: u64,
    /// Number of entries evicted due to byte pressure
    pub evictions: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// Bytes charged to resident entries
    pub used_bytes: i64,
    /// Configured byte capacity, 0 = unbounded
    pub max_bytes: i64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new(max_bytes: i64) -> Self {
        Self {
            max_bytes,
            ..Self::default()
        }
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
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

    // == Record Evictions ==
    /// Adds `count` to the eviction counter.
    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }

    // == Update Occupancy ==
    /// Updates the entry count and byte usage.
    pub fn set_occupancy(&mut self, total_entries: usize, used_bytes: i64) {
        self.total_entries = total_entries;
        self.used_bytes = used_bytes;
    }
}
