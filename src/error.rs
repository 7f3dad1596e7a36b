//! Error types for the sliced cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the sliced cache.
///
/// Only construction and `max_size` assignment can fail. Lookups, writes,
/// deletes and iteration never return an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Slice count is not an integer or is below the minimum of 2
    #[error("slice count must be an integer >= 2, got {0}")]
    InvalidSliceCount(String),

    /// Max size is not an integer, is zero, or is smaller than the slice count
    #[error("max size must be an integer >= 1 and >= slice count {slice_count}, got {value}")]
    InvalidMaxSize {
        /// The rejected value, as given
        value: String,
        /// Slice count the value was checked against
        slice_count: usize,
    },
}

impl CacheError {
    pub(crate) fn slice_count(value: impl ToString) -> Self {
        CacheError::InvalidSliceCount(value.to_string())
    }

    pub(crate) fn max_size(value: impl ToString, slice_count: usize) -> Self {
        CacheError::InvalidMaxSize {
            value: value.to_string(),
            slice_count,
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the sliced cache.
pub type Result<T> = std::result::Result<T, CacheError>;
