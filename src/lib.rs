//! Sliced Cache - A bounded in-memory cache with whole-slice eviction
//!
//! [`SlicedCache`] keeps its entries in a fixed ring of slices and discards the
//! oldest slice when it runs out of room, trading exact recency tracking for
//! cheap writes and a hard memory bound.
//!
//! [`Registry`] hosts id-keyed deduplication helpers (singletons, in-flight
//! async calls, interval timers, run-once closures) on an ordinary map.

pub mod cache;
pub mod config;
pub mod error;
pub mod registry;

pub use cache::{
    CacheStats, Iter, SlicedCache, DEFAULT_MAX_SIZE, DEFAULT_SLICE_COUNT, MIN_SLICE_COUNT,
};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use registry::{Id, IntervalHandle, PendingOptions, Registry, Singleton};
