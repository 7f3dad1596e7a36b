//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check size accounting, uniqueness and capacity bounds
//! over random operation sequences.

use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

use crate::cache::SlicedCache;

// == Strategies ==
/// Small key space so that overwrites and deletes hit existing keys
fn key_strategy() -> impl Strategy<Value = u16> {
    0u16..64
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: u16, value: u32 },
    Get { key: u16 },
    Delete { key: u16 },
    Clear,
    SetMaxSize { max_size: usize },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        8 => (key_strategy(), any::<u32>()).prop_map(|(key, value)| CacheOp::Set { key, value }),
        3 => key_strategy().prop_map(|key| CacheOp::Get { key }),
        3 => key_strategy().prop_map(|key| CacheOp::Delete { key }),
        1 => Just(CacheOp::Clear),
        1 => (1usize..80).prop_map(|max_size| CacheOp::SetMaxSize { max_size }),
    ]
}

fn sizes_strategy() -> impl Strategy<Value = (usize, usize)> {
    (2usize..6).prop_flat_map(|slice_count| (slice_count..60, Just(slice_count)))
}

/// Number of keys in the key space the cache reports as present
fn live_keys(cache: &SlicedCache<u16, u32>) -> usize {
    (0u16..64).filter(|k| cache.contains_key(k)).count()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // For any operation sequence, len() equals the number of retrievable
    // keys and iteration yields every key exactly once.
    #[test]
    fn prop_size_accounting(
        (max_size, slice_count) in sizes_strategy(),
        ops in prop::collection::vec(cache_op_strategy(), 1..200)
    ) {
        let mut cache = SlicedCache::with_capacity(max_size, slice_count).unwrap();

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    cache.set(key, value);
                }
                CacheOp::Get { key } => {
                    prop_assert_eq!(cache.get(&key).is_some(), cache.contains_key(&key));
                }
                CacheOp::Delete { key } => {
                    let existed = cache.contains_key(&key);
                    prop_assert_eq!(cache.delete(&key), existed);
                    prop_assert!(!cache.contains_key(&key));
                }
                CacheOp::Clear => cache.clear(),
                CacheOp::SetMaxSize { max_size } => {
                    let before = (cache.max_size(), cache.max_slice_size(), cache.len());
                    match cache.set_max_size(max_size) {
                        Ok(()) => prop_assert_eq!(cache.max_slice_size(), max_size / slice_count),
                        Err(_) => prop_assert_eq!(
                            (cache.max_size(), cache.max_slice_size(), cache.len()),
                            before
                        ),
                    }
                }
            }

            prop_assert_eq!(cache.len(), live_keys(&cache));
            let seen: HashSet<u16> = cache.keys().copied().collect();
            prop_assert_eq!(seen.len(), cache.len(), "duplicate key in iteration");
            prop_assert_eq!(cache.iter().len(), cache.len());
            prop_assert_eq!(cache.stats().total_entries, cache.len());
        }
    }

    // After every write that adds a key, the cache is within max_size.
    #[test]
    fn prop_capacity_restored_after_write(
        (max_size, slice_count) in sizes_strategy(),
        ops in prop::collection::vec(cache_op_strategy(), 1..200)
    ) {
        let mut cache = SlicedCache::with_capacity(max_size, slice_count).unwrap();

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    let is_new = !cache.contains_key(&key);
                    cache.set(key, value);
                    prop_assert_eq!(cache.get(&key), Some(&value));
                    if is_new {
                        prop_assert!(
                            cache.len() <= cache.max_size(),
                            "len {} exceeds max {}",
                            cache.len(),
                            cache.max_size()
                        );
                    }
                }
                CacheOp::SetMaxSize { max_size } => {
                    let len = cache.len();
                    let _ = cache.set_max_size(max_size);
                    // Never evicts eagerly
                    prop_assert_eq!(cache.len(), len);
                }
                CacheOp::Delete { key } => {
                    cache.delete(&key);
                }
                CacheOp::Get { .. } | CacheOp::Clear => {}
            }
        }
    }

    // Repeated writes of the same key never grow the cache.
    #[test]
    fn prop_overwrite_never_grows(
        key in key_strategy(),
        values in prop::collection::vec(any::<u32>(), 1..50)
    ) {
        let mut cache = SlicedCache::with_capacity(10, 2).unwrap();
        for value in &values {
            cache.set(key, *value);
            prop_assert_eq!(cache.len(), 1);
        }
        prop_assert_eq!(cache.get(&key), values.last());
    }

    // Without evictions the cache behaves like a plain map.
    #[test]
    fn prop_matches_hashmap_without_eviction(
        ops in prop::collection::vec(cache_op_strategy(), 1..100)
    ) {
        // Key space is 64, so slices of 64 never fill up
        let mut cache = SlicedCache::with_capacity(256, 4).unwrap();
        let mut model: HashMap<u16, u32> = HashMap::new();

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    prop_assert_eq!(cache.set(key, value), model.insert(key, value));
                }
                CacheOp::Get { key } => {
                    prop_assert_eq!(cache.get(&key), model.get(&key));
                }
                CacheOp::Delete { key } => {
                    prop_assert_eq!(cache.remove(&key), model.remove(&key));
                }
                CacheOp::Clear => {
                    cache.clear();
                    model.clear();
                }
                CacheOp::SetMaxSize { .. } => {}
            }
            prop_assert_eq!(cache.len(), model.len());
        }
        prop_assert_eq!(cache.stats().evicted_entries, 0);
    }

    // Eviction discards the oldest generation: every key written after the
    // last eviction is still present.
    #[test]
    fn prop_recent_keys_survive(
        (max_size, slice_count) in sizes_strategy(),
        count in 1usize..300
    ) {
        let mut cache = SlicedCache::with_capacity(max_size, slice_count).unwrap();
        let keep = max_size / slice_count;

        for i in 0..count {
            cache.set(i, i);
        }
        // The newest max_slice_size - 1 keys always fit in the current slice
        for i in count.saturating_sub(keep.saturating_sub(1))..count {
            prop_assert_eq!(cache.get(&i), Some(&i));
        }
        // Survivors come out oldest first
        let keys: Vec<usize> = cache.keys().copied().collect();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        prop_assert_eq!(keys, sorted);
    }
}
