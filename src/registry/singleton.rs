//! Singleton helpers.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use super::{Id, Namespace, Registry, Slot, Tag};

impl Registry {
    /// Returns the shared instance for `id`, creating it with `default` on
    /// first access.
    ///
    /// A blank id (empty string or zero) is treated as `"default"`. Instances
    /// are also keyed by type, so the same id can hold one value per type.
    ///
    /// # Example
    /// ```
    /// use sliced_cache::Registry;
    ///
    /// let registry = Registry::new();
    /// let a = registry.singleton_obj("config", || vec![1, 2, 3]);
    /// let b = registry.singleton_obj("config", Vec::<i32>::new);
    /// assert_eq!(*b, vec![1, 2, 3]);
    /// assert!(std::sync::Arc::ptr_eq(&a, &b));
    /// ```
    pub fn singleton_obj<T, F>(&self, id: impl Into<Id>, default: F) -> Arc<T>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        let slot = singleton_slot::<T>(id.into());
        self.get_or_insert_with(&slot, default)
    }

    /// Returns a handle to the singleton for `id`.
    ///
    /// The handle can read, replace and delete the shared value. `default`
    /// builds the value whenever it is read while absent.
    pub fn singleton<T, F>(&self, id: impl Into<Id>, default: F) -> Singleton<T>
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Singleton {
            registry: self.clone(),
            slot: singleton_slot::<T>(id.into()),
            default: Arc::new(default),
        }
    }
}

fn singleton_slot<T: 'static>(id: Id) -> Slot {
    Slot::new::<T>(Namespace::Singleton, Tag::Id(id.or_default()))
}

// == Singleton ==
/// Handle to a shared value in a [`Registry`].
pub struct Singleton<T> {
    registry: Registry,
    slot: Slot,
    default: Arc<dyn Fn() -> T + Send + Sync>,
}

impl<T> Singleton<T>
where
    T: Any + Send + Sync,
{
    /// Current value, created from the default factory if absent.
    pub fn value(&self) -> Arc<T> {
        self.registry
            .get_or_insert_with(&self.slot, || (self.default)())
    }

    /// Replaces the value with `action(&current)` and returns the new value.
    ///
    /// Read and write are separate steps: concurrent updates are last-writer-wins.
    pub fn update<F>(&self, action: F) -> Arc<T>
    where
        F: FnOnce(&T) -> T,
    {
        let current = self.value();
        self.set(action(&current))
    }

    /// Replaces the value and returns it.
    pub fn set(&self, value: T) -> Arc<T> {
        let value = Arc::new(value);
        self.registry.replace(self.slot.clone(), value.clone());
        value
    }

    /// Forgets the value. The next read recreates it from the default.
    pub fn delete(&self) {
        if self.registry.remove(&self.slot) {
            trace!(slot = ?self.slot, "singleton deleted");
        }
    }
}

impl<T> Clone for Singleton<T> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            slot: self.slot.clone(),
            default: self.default.clone(),
        }
    }
}

impl<T> fmt::Debug for Singleton<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Singleton").field("slot", &self.slot).finish()
    }
}
