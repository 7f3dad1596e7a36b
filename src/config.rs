//! Configuration Module
//!
//! Handles loading and validating cache sizing parameters, either from
//! explicit values or from environment variables.

use std::env;
use std::str::FromStr;

use serde::Deserialize;

use crate::cache::{DEFAULT_MAX_SIZE, DEFAULT_SLICE_COUNT, MIN_SLICE_COUNT};
use crate::error::{CacheError, Result};

/// Environment variable holding the total capacity.
pub const MAX_SIZE_ENV: &str = "SLICED_CACHE_MAX_SIZE";
/// Environment variable holding the number of slices.
pub const SLICE_COUNT_ENV: &str = "SLICED_CACHE_SLICE_COUNT";

/// Cache sizing parameters.
///
/// All values can be configured via environment variables with sensible defaults.
/// Deserialized configs are validated; missing fields take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawCacheConfig")]
pub struct CacheConfig {
    /// Maximum number of entries the cache may hold after a write
    pub max_size: usize,
    /// Number of slices in the ring, fixed for the cache's lifetime
    pub slice_count: usize,
}

impl CacheConfig {
    /// Creates a config from explicit values, validating them.
    pub fn new(max_size: usize, slice_count: usize) -> Result<Self> {
        let config = Self {
            max_size,
            slice_count,
        };
        config.validate()?;
        Ok(config)
    }

    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SLICED_CACHE_MAX_SIZE` - Total capacity (default: 10000)
    /// - `SLICED_CACHE_SLICE_COUNT` - Number of slices (default: 2)
    ///
    /// Unset variables fall back to their defaults. A variable that is set but
    /// not a non-negative integer (for example `1.5`) is rejected.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`CacheConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let slice_count = match lookup(SLICE_COUNT_ENV) {
            Some(raw) => parse_integer(&raw).ok_or_else(|| CacheError::slice_count(raw.trim()))?,
            None => DEFAULT_SLICE_COUNT,
        };
        validate_slice_count(slice_count)?;
        let max_size = match lookup(MAX_SIZE_ENV) {
            Some(raw) => parse_integer(&raw)
                .ok_or_else(|| CacheError::max_size(raw.trim(), slice_count))?,
            None => DEFAULT_MAX_SIZE,
        };
        Self::new(max_size, slice_count)
    }

    /// Checks the sizing rules: `slice_count >= 2`, `max_size >= 1` and
    /// `max_size >= slice_count`.
    pub fn validate(&self) -> Result<()> {
        validate_slice_count(self.slice_count)?;
        validate_max_size(self.max_size, self.slice_count)
    }

    /// Per-slice capacity derived from this config. Zero when `slice_count`
    /// is zero.
    pub fn max_slice_size(&self) -> usize {
        self.max_size.checked_div(self.slice_count).unwrap_or(0)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            slice_count: DEFAULT_SLICE_COUNT,
        }
    }
}

/// Unchecked shape of a serialized config.
#[derive(Deserialize)]
#[serde(default)]
struct RawCacheConfig {
    max_size: usize,
    slice_count: usize,
}

impl Default for RawCacheConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            slice_count: DEFAULT_SLICE_COUNT,
        }
    }
}

impl TryFrom<RawCacheConfig> for CacheConfig {
    type Error = CacheError;

    fn try_from(raw: RawCacheConfig) -> Result<Self> {
        Self::new(raw.max_size, raw.slice_count)
    }
}

pub(crate) fn validate_slice_count(slice_count: usize) -> Result<()> {
    if slice_count < MIN_SLICE_COUNT {
        return Err(CacheError::slice_count(slice_count));
    }
    Ok(())
}

pub(crate) fn validate_max_size(max_size: usize, slice_count: usize) -> Result<()> {
    if max_size < 1 || max_size < slice_count {
        return Err(CacheError::max_size(max_size, slice_count));
    }
    Ok(())
}

fn parse_integer<T: FromStr>(raw: &str) -> Option<T> {
    raw.trim().parse().ok()
}
