//! Cache Iterator Module
//!
//! Walks the slice ring from the oldest slice to the newest.

use std::iter::FusedIterator;

use indexmap::map;
use indexmap::IndexMap;

// == Iter ==
/// Iterator over `(&K, &V)` pairs of a [`SlicedCache`](crate::cache::SlicedCache).
///
/// Created by [`SlicedCache::iter`](crate::cache::SlicedCache::iter).
#[derive(Debug)]
pub struct Iter<'a, K, V> {
    slices: &'a [IndexMap<K, V>],
    /// Ring index of the next slice to open
    next_slice: usize,
    /// Slices not opened yet
    slices_left: usize,
    inner: map::Iter<'a, K, V>,
    /// Entries not yielded yet
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(slices: &'a [IndexMap<K, V>], oldest: usize, len: usize) -> Self {
        Self {
            slices,
            next_slice: (oldest + 1) % slices.len(),
            slices_left: slices.len() - 1,
            inner: slices[oldest].iter(),
            remaining: len,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.inner.next() {
                self.remaining = self.remaining.saturating_sub(1);
                return Some(item);
            }
            if self.slices_left == 0 {
                return None;
            }
            self.inner = self.slices[self.next_slice].iter();
            self.next_slice = (self.next_slice + 1) % self.slices.len();
            self.slices_left -= 1;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}
