//! Run-at-most-once guard.

use tracing::trace;

use super::{Id, Namespace, Registry, Slot, Tag};

/// Marker stored for a closure that has run, or is running.
struct Ran;

/// Frees the slot again unless the closure returned normally.
struct Claim<'a> {
    registry: &'a Registry,
    slot: &'a Slot,
    armed: bool,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.registry.remove(self.slot);
        }
    }
}

impl Registry {
    /// Runs `f` unless something already ran under the same key in this
    /// registry. Returns whether `f` ran.
    ///
    /// The key is `id`, or the type of `f` when `id` is `None` or blank, so a
    /// given closure in the source runs once no matter how often the enclosing
    /// code executes. If `f` panics the key is released and a later call runs
    /// again.
    ///
    /// # Example
    /// ```
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use sliced_cache::Registry;
    ///
    /// static HITS: AtomicUsize = AtomicUsize::new(0);
    ///
    /// let registry = Registry::new();
    /// for _ in 0..3 {
    ///     registry.once_run(Some("init".into()), || {
    ///         HITS.fetch_add(1, Ordering::SeqCst);
    ///     });
    /// }
    /// assert_eq!(HITS.load(Ordering::SeqCst), 1);
    /// ```
    pub fn once_run<F>(&self, id: Option<Id>, f: F) -> bool
    where
        F: FnOnce() + 'static,
    {
        let slot = Slot::new::<Ran>(Namespace::Once, Tag::id_or_fn::<F>(id));
        // Claimed before `f` runs so a nested call with the same key is skipped
        if !self.try_insert(slot.clone(), Ran) {
            trace!("once_run skipped");
            return false;
        }
        let mut claim = Claim {
            registry: self,
            slot: &slot,
            armed: true,
        };
        f();
        claim.armed = false;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::panic::{self, AssertUnwindSafe};
    use std::rc::Rc;

    #[test]
    fn test_once_run_with_id() {
        let registry = Registry::new();
        let count = Rc::new(Cell::new(0));

        for _ in 0..3 {
            let count = count.clone();
            registry.once_run(Some(Id::from("setup")), move || count.set(count.get() + 1));
        }
        assert_eq!(count.get(), 1);

        let other = count.clone();
        assert!(registry.once_run(Some(Id::from("other")), move || other.set(other.get() + 1)));
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_once_run_without_id_keys_by_closure() {
        let registry = Registry::new();
        let count = Rc::new(Cell::new(0));

        let mut ran = Vec::new();
        for _ in 0..3 {
            let count = count.clone();
            ran.push(registry.once_run(None, move || count.set(count.get() + 1)));
        }
        assert_eq!(ran, vec![true, false, false]);
        assert_eq!(count.get(), 1);

        // A different closure is a different key
        let count2 = count.clone();
        assert!(registry.once_run(None, move || count2.set(count2.get() + 10)));
        assert_eq!(count.get(), 11);
    }

    #[test]
    fn test_once_run_panicking_closure_can_run_again() {
        let registry = Registry::new();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            registry.once_run(Some(Id::from("init")), || panic!("init failed"))
        }));
        assert!(result.is_err());
        assert!(registry.is_empty());

        assert!(registry.once_run(Some(Id::from("init")), || {}));
        assert!(!registry.once_run(Some(Id::from("init")), || {}));
    }

    #[test]
    fn test_once_run_nested_same_id_is_skipped() {
        let registry = Registry::new();
        let inner = registry.clone();
        let nested = Rc::new(Cell::new(None));
        let seen = nested.clone();

        assert!(registry.once_run(Some(Id::from("boot")), move || {
            seen.set(Some(inner.once_run(Some(Id::from("boot")), || {})));
        }));
        assert_eq!(nested.get(), Some(false));
    }

    #[test]
    fn test_once_run_resets_with_clear() {
        let registry = Registry::new();
        assert!(registry.once_run(Some(Id::from(1)), || {}));
        assert!(!registry.once_run(Some(Id::from(1)), || {}));
        registry.clear();
        assert!(registry.once_run(Some(Id::from(1)), || {}));
    }
}
