//! Registry Module
//!
//! An explicitly owned, id-keyed store behind a handful of deduplication
//! helpers:
//! - singletons: one shared instance per id
//! - pending: one in-flight async operation per id
//! - interval: one repeating timer per id
//! - once: a closure that runs at most once per id
//!
//! The store is an ordinary unbounded map; it is unrelated to
//! [`SlicedCache`](crate::SlicedCache). Clones of a [`Registry`] share the same
//! store, and dropping the last clone cancels any timers still running.

mod id;
mod interval;
mod once;
mod pending;
mod singleton;

use std::any::{Any, TypeId};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

pub use id::Id;
pub use interval::IntervalHandle;
pub use pending::PendingOptions;
pub use singleton::Singleton;

type Stored = Arc<dyn Any + Send + Sync>;

/// Which helper owns a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Namespace {
    Singleton,
    Pending,
    Timer,
    Once,
}

/// Explicit id, or the type of the closure when no id is given.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Tag {
    Id(Id),
    Fn(TypeId),
}

impl Tag {
    /// Uses `id` unless it is missing or blank, else the type of `F`.
    pub(crate) fn id_or_fn<F: 'static>(id: Option<Id>) -> Self {
        match id.filter(|id| !id.is_blank()) {
            Some(id) => Tag::Id(id),
            None => Tag::Fn(TypeId::of::<F>()),
        }
    }
}

/// Map key: namespace, tag and stored type never collide across helpers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Slot {
    namespace: Namespace,
    tag: Tag,
    ty: TypeId,
}

impl Slot {
    pub(crate) fn new<T: 'static>(namespace: Namespace, tag: Tag) -> Self {
        Self {
            namespace,
            tag,
            ty: TypeId::of::<T>(),
        }
    }
}

// == Registry ==
/// Shared id-keyed store for the deduplication helpers.
#[derive(Clone, Default)]
pub struct Registry {
    entries: Arc<Mutex<HashMap<Slot, Stored>>>,
    generation: Arc<AtomicU64>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live slots across all helpers.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if no helper holds a slot.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Forgets every slot and cancels running timers.
    pub fn clear(&self) {
        let old = std::mem::take(&mut *self.entries.lock());
        tracing::debug!(slots = old.len(), "registry cleared");
    }

    pub(crate) fn downgrade(&self) -> WeakRegistry {
        WeakRegistry {
            entries: Arc::downgrade(&self.entries),
            generation: Arc::downgrade(&self.generation),
        }
    }

    pub(crate) fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn lookup<T>(&self, slot: &Slot) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let stored = self.entries.lock().get(slot).cloned()?;
        stored.downcast::<T>().ok()
    }

    /// Returns the value in `slot`, creating it with `create` if absent.
    ///
    /// `create` runs without the lock held, so it may use the registry. If two
    /// callers race, the first insert wins and both get that value.
    pub(crate) fn get_or_insert_with<T, F>(&self, slot: &Slot, create: F) -> Arc<T>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        if let Some(found) = self.lookup::<T>(slot) {
            return found;
        }

        let created = Arc::new(create());
        let stored = self
            .entries
            .lock()
            .entry(slot.clone())
            .or_insert_with(|| created.clone() as Stored)
            .clone();
        stored.downcast::<T>().unwrap_or(created)
    }

    /// Inserts `value` unless the slot is taken. Returns whether it inserted.
    pub(crate) fn try_insert<T>(&self, slot: Slot, value: T) -> bool
    where
        T: Any + Send + Sync,
    {
        match self.entries.lock().entry(slot) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(Arc::new(value));
                true
            }
        }
    }

    /// Stores `value`, dropping whatever the slot held before.
    pub(crate) fn replace<T>(&self, slot: Slot, value: Arc<T>)
    where
        T: Any + Send + Sync,
    {
        let previous = self.entries.lock().insert(slot, value);
        drop(previous);
    }

    pub(crate) fn remove(&self, slot: &Slot) -> bool {
        let removed = self.entries.lock().remove(slot);
        removed.is_some()
    }

    /// Removes the slot only if its current value satisfies `pred`.
    pub(crate) fn remove_where<T, P>(&self, slot: &Slot, pred: P) -> bool
    where
        T: Any + Send + Sync,
        P: FnOnce(&T) -> bool,
    {
        let removed = {
            let mut entries = self.entries.lock();
            let matches = entries
                .get(slot)
                .and_then(|stored| (**stored).downcast_ref::<T>())
                .map_or(false, pred);
            if matches {
                entries.remove(slot)
            } else {
                None
            }
        };
        removed.is_some()
    }

    /// Removes the slot only if it still holds `current`.
    pub(crate) fn remove_if_same<T>(&self, slot: &Slot, current: &Arc<T>) -> bool
    where
        T: Any + Send + Sync,
    {
        self.remove_where::<T, _>(slot, |stored| std::ptr::eq(stored, Arc::as_ptr(current)))
    }
}

/// Non-owning registry reference held by handles.
#[derive(Debug, Clone)]
pub(crate) struct WeakRegistry {
    entries: Weak<Mutex<HashMap<Slot, Stored>>>,
    generation: Weak<AtomicU64>,
}

impl WeakRegistry {
    pub(crate) fn upgrade(&self) -> Option<Registry> {
        Some(Registry {
            entries: self.entries.upgrade()?,
            generation: self.generation.upgrade()?,
        })
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry").field("slots", &self.len()).finish()
    }
}
