//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, expiries and evictions.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of reads that returned a live entry
    pub hits: u64,
    /// Number of reads that found nothing live (key absent or expired)
    pub misses: u64,
    /// Number of rows purged because they had expired (on read or prune)
    pub expired: u64,
    /// Number of entries evicted by capacity enforcement
    pub evictions: u64,
    /// Current number of live entries
    pub total_entries: u64,
    /// Current sum of live payload sizes
    pub total_bytes: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Record Hit ==
    /// Counts a read that returned a live entry.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    /// Counts a read that found nothing live, including expired entries.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Expired ==
    /// Adds `count` rows purged because they had expired.
    pub fn record_expired(&mut self, count: u64) {
        self.expired += count;
    }

    // == Record Evictions ==
    /// Adds `count` rows removed by capacity enforcement.
    pub fn record_evictions(&mut self, count: u64) {
        self.evictions += count;
    }
}
