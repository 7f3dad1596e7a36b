//! Cache Module
//!
//! Provides a bounded in-memory cache that evicts a whole slice of entries,
//! oldest first, instead of tracking per-key recency or expiry.

mod iter;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use iter::Iter;
pub use stats::CacheStats;
pub use store::SlicedCache;

// == Public Constants ==
/// Capacity used when none is given
pub const DEFAULT_MAX_SIZE: usize = 10_000;

/// Slice count used when none is given
pub const DEFAULT_SLICE_COUNT: usize = 2;

/// Smallest allowed slice count
pub const MIN_SLICE_COUNT: usize = 2;
