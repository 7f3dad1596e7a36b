//! Cache Statistics Module
//!
//! Tracks slice rotations and the entries they discarded.

use serde::Serialize;

// == Cache Stats ==
/// Eviction counters for a [`SlicedCache`](crate::cache::SlicedCache).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of times the oldest slice was discarded
    pub rotations: u64,
    /// Number of entries dropped by those rotations
    pub evicted_entries: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Rotation ==
    /// Records one slice rotation that discarded `evicted` entries.
    pub fn record_rotation(&mut self, evicted: usize) {
        self.rotations += 1;
        self.evicted_entries += evicted as u64;
    }

    // == Average Eviction ==
    /// Mean number of entries discarded per rotation, or 0.0 before the first.
    pub fn mean_evicted_per_rotation(&self) -> f64 {
        if self.rotations == 0 {
            0.0
        } else {
            self.evicted_entries as f64 / self.rotations as f64
        }
    }

    // == Update Entry Count ==
    /// Updates the total entries count.
    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
