//! Cache Store Module
//!
//! Main cache engine: a ring of insertion-ordered slices with an incremental
//! entry count and whole-slice eviction.

use std::borrow::Borrow;
use std::hash::Hash;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::cache::{CacheStats, Iter};
use crate::config::{validate_max_size, validate_slice_count, CacheConfig};
use crate::error::Result;

// == Sliced Cache ==
/// Bounded key-value cache that evicts its oldest slice wholesale.
///
/// Storage is split into `slice_count` maps arranged as a ring. Writes land in
/// the current slice; when it reaches `max_size / slice_count` entries, or the
/// total exceeds `max_size`, the slice after it (the oldest) is cleared and
/// becomes the new current slice.
///
/// A key lives in at most one slice. Lookups scan from the newest slice to the
/// oldest, so they cost at most `slice_count` hash lookups.
///
/// Mutation takes `&mut self`; share an instance behind a lock if needed.
///
/// # Example
/// ```
/// use sliced_cache::SlicedCache;
///
/// let mut cache = SlicedCache::with_max_size(10).unwrap();
/// for i in 0..11 {
///     cache.set(format!("k{}", i), i);
/// }
/// // The first slice (k0..k4) was evicted to make room for k10.
/// assert_eq!(cache.len(), 6);
/// assert!(!cache.contains_key("k0"));
/// assert_eq!(cache.get("k10"), Some(&10));
/// ```
#[derive(Debug, Clone)]
pub struct SlicedCache<K, V> {
    /// Ring of slices; `current` is the newest, `current + 1` the oldest
    slices: Vec<IndexMap<K, V>>,
    /// Index of the writable slice
    current: usize,
    /// Number of slices, fixed at construction
    slice_count: usize,
    /// Total capacity enforced on writes
    max_size: usize,
    /// `max_size / slice_count`
    max_slice_size: usize,
    /// Live entries across all slices
    item_count: usize,
    /// Eviction counters
    stats: CacheStats,
}

impl<K, V> SlicedCache<K, V>
where
    K: Hash + Eq,
{
    // == Constructors ==
    /// Creates an empty cache with the default capacity (10000) and two slices.
    pub fn new() -> Self {
        Self::build(IndexMap::new(), CacheConfig::default())
    }

    /// Creates an empty cache holding up to `max_size` entries in two slices.
    pub fn with_max_size(max_size: usize) -> Result<Self> {
        Self::with_capacity(max_size, CacheConfig::default().slice_count)
    }

    /// Creates an empty cache with an explicit capacity and slice count.
    ///
    /// # Errors
    /// - [`CacheError::InvalidSliceCount`](crate::CacheError::InvalidSliceCount)
    ///   if `slice_count < 2`
    /// - [`CacheError::InvalidMaxSize`](crate::CacheError::InvalidMaxSize)
    ///   if `max_size` is zero or smaller than `slice_count`
    pub fn with_capacity(max_size: usize, slice_count: usize) -> Result<Self> {
        Self::from_config(&CacheConfig {
            max_size,
            slice_count,
        })
    }

    /// Creates a cache pre-filled with `entries`.
    ///
    /// `None` for either size falls back to its default. All entries go into
    /// the first slice; duplicate keys keep the last value. The initial entries
    /// are not trimmed to `max_size`, the next write enforces it.
    pub fn with_entries<I>(
        entries: I,
        max_size: Option<usize>,
        slice_count: Option<usize>,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let defaults = CacheConfig::default();
        let config = CacheConfig {
            max_size: max_size.unwrap_or(defaults.max_size),
            slice_count: slice_count.unwrap_or(defaults.slice_count),
        };
        config.validate()?;
        Ok(Self::build(entries.into_iter().collect(), config))
    }

    /// Creates an empty cache sized by `config`.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        validate_slice_count(config.slice_count)?;
        validate_max_size(config.max_size, config.slice_count)?;
        Ok(Self::build(IndexMap::new(), *config))
    }

    // Expects a validated config.
    fn build(first: IndexMap<K, V>, config: CacheConfig) -> Self {
        let item_count = first.len();
        let mut slices = Vec::with_capacity(config.slice_count);
        slices.push(first);
        slices.resize_with(config.slice_count, IndexMap::new);

        let mut stats = CacheStats::new();
        stats.set_total_entries(item_count);

        Self {
            slices,
            current: 0,
            slice_count: config.slice_count,
            max_size: config.max_size,
            max_slice_size: config.max_slice_size(),
            item_count,
            stats,
        }
    }

    // == Get ==
    /// Returns the value stored for `key`, newest slice first.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        ring_from(self.current, self.slice_count).find_map(|idx| self.slices[idx].get(key))
    }

    /// Returns a mutable reference to the value for `key`.
    ///
    /// The entry keeps its slice and position.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = ring_from(self.current, self.slice_count)
            .find(|&idx| self.slices[idx].contains_key(key))?;
        self.slices[idx].get_mut(key)
    }

    // == Contains ==
    /// Returns true if any slice holds `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        ring_from(self.current, self.slice_count).any(|idx| self.slices[idx].contains_key(key))
    }

    // == Set ==
    /// Stores `value` under `key` in the current slice.
    ///
    /// An existing entry is moved to the current slice and its previous value
    /// returned; the entry count is unchanged. A new key bumps the count and
    /// then rotates the ring until the current slice has room and the total
    /// is within `max_size`. After a sharp `max_size` decrease this may
    /// discard several slices in one call.
    pub fn set(&mut self, key: K, value: V) -> Option<V> {
        let previous = self.remove(&key);
        self.item_count += 1;

        if previous.is_none() {
            while self.slices[self.current].len() >= self.max_slice_size
                || self.item_count > self.max_size
            {
                self.shrink();
            }
        }

        self.slices[self.current].insert(key, value);
        self.stats.set_total_entries(self.item_count);
        previous
    }

    // == Shrink ==
    /// Discards the oldest slice and makes it the current slice.
    pub fn shrink(&mut self) {
        let next = (self.current + 1) % self.slice_count;
        let evicted = self.slices[next].len();

        self.item_count -= evicted;
        self.slices[next].clear();
        self.current = next;

        self.stats.record_rotation(evicted);
        self.stats.set_total_entries(self.item_count);
        debug!(
            slice = next,
            evicted,
            remaining = self.item_count,
            "rotated oldest slice"
        );
    }

    // == Remove ==
    /// Removes `key` and returns its value, if present.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        for idx in ring_from(self.current, self.slice_count) {
            // shift_remove keeps the slice's insertion order intact
            if let Some(value) = self.slices[idx].shift_remove(key) {
                self.item_count -= 1;
                self.stats.set_total_entries(self.item_count);
                return Some(value);
            }
        }
        None
    }

    // == Delete ==
    /// Removes `key`, returning whether it was present.
    pub fn delete<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove(key).is_some()
    }

    // == Clear ==
    /// Empties every slice. The write cursor stays where it is.
    pub fn clear(&mut self) {
        self.slices.iter_mut().for_each(IndexMap::clear);
        self.item_count = 0;
        self.stats.set_total_entries(0);
    }

    // == Max Size ==
    /// Changes the total capacity.
    ///
    /// Nothing is evicted here, even when the cache currently holds more than
    /// `max_size` entries; the next write that adds a key restores the bound.
    /// On error the previous capacity is kept.
    pub fn set_max_size(&mut self, max_size: usize) -> Result<()> {
        validate_max_size(max_size, self.slice_count)?;

        if max_size < self.item_count {
            warn!(
                max_size,
                len = self.item_count,
                "max size lowered below current length, eviction deferred to next write"
            );
        }
        self.max_size = max_size;
        self.max_slice_size = max_size / self.slice_count;
        Ok(())
    }
}

impl<K, V> SlicedCache<K, V> {
    // == Iteration ==
    /// Iterates entries from the oldest slice to the newest, each slice in
    /// insertion order.
    ///
    /// This approximates global insertion order: it is exact within a slice,
    /// and an overwritten key appears where it was last written.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(
            &self.slices,
            (self.current + 1) % self.slice_count,
            self.item_count,
        )
    }

    /// Calls `visit` for every entry, in [`iter`](Self::iter) order.
    pub fn for_each<F>(&self, mut visit: F)
    where
        F: FnMut(&K, &V),
    {
        self.iter().for_each(|(k, v)| visit(k, v));
    }

    /// Keys in [`iter`](Self::iter) order.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    /// Values in [`iter`](Self::iter) order.
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// Collects owned copies of all entries, in [`iter`](Self::iter) order.
    pub fn entries(&self) -> Vec<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    // == Accessors ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.item_count
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.item_count == 0
    }

    /// Total capacity enforced on writes.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Number of slices in the ring.
    pub fn slice_count(&self) -> usize {
        self.slice_count
    }

    /// Per-slice capacity, `max_size / slice_count`.
    pub fn max_slice_size(&self) -> usize {
        self.max_slice_size
    }

    /// Returns a snapshot of the eviction counters.
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }
}

impl<K: Hash + Eq, V> Default for SlicedCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq, V> FromIterator<(K, V)> for SlicedCache<K, V> {
    /// Builds a default-sized cache with every pair in the first slice.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::build(iter.into_iter().collect(), CacheConfig::default())
    }
}

impl<K: Hash + Eq, V> Extend<(K, V)> for SlicedCache<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.set(key, value);
        }
    }
}

impl<'a, K, V> IntoIterator for &'a SlicedCache<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Slice indices starting at `start` and walking the whole ring once.
fn ring_from(start: usize, count: usize) -> impl Iterator<Item = usize> {
    (0..count).map(move |offset| (start + offset) % count)
}
