//! In-flight deduplication of async operations.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;
use tracing::{debug, trace};

use super::{Id, Namespace, Registry, Slot, Tag};

/// Options for [`Registry::run_on_pending`].
#[derive(Debug, Clone, Default)]
pub struct PendingOptions {
    /// Deduplication key. Without one (or with a blank one) calls are keyed
    /// by the type of the closure passed in.
    pub id: Option<Id>,
    /// How long the finished result stays shared after completion. `None`
    /// forgets it as soon as the operation finishes.
    pub cache_time: Option<Duration>,
}

impl PendingOptions {
    /// Options keyed by `id`, with no cache time.
    pub fn id(id: impl Into<Id>) -> Self {
        Self {
            id: Some(id.into()),
            cache_time: None,
        }
    }

    /// Keeps the result shared for `cache_time` after completion.
    pub fn cache_time(mut self, cache_time: Duration) -> Self {
        self.cache_time = Some(cache_time);
        self
    }
}

impl Registry {
    /// Runs `operation` unless one with the same key is already pending, in
    /// which case the caller waits for and receives that operation's result.
    ///
    /// Once the operation finishes its result is dropped from the registry,
    /// immediately or after `cache_time`; during that window later callers get
    /// the finished result without running anything. Errors are shared the
    /// same way, so use a `Clone` error type in `T = Result<_, E>`.
    ///
    /// If the caller running the operation is cancelled, one of the waiting
    /// callers runs its own `operation` instead. When nobody is waiting, the
    /// unfinished slot is dropped from the registry.
    ///
    /// # Example
    /// ```
    /// use sliced_cache::{PendingOptions, Registry};
    ///
    /// # tokio_test::block_on(async {
    /// let registry = Registry::new();
    /// let (a, b) = tokio::join!(
    ///     registry.run_on_pending(PendingOptions::id("user:1"), || async { 1 }),
    ///     registry.run_on_pending(PendingOptions::id("user:1"), || async { 2 }),
    /// );
    /// assert_eq!((a, b), (1, 1));
    /// # });
    /// ```
    pub async fn run_on_pending<T, F, Fut>(&self, options: PendingOptions, operation: F) -> T
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut + 'static,
        Fut: Future<Output = T>,
    {
        let slot = Slot::new::<OnceCell<T>>(Namespace::Pending, Tag::id_or_fn::<F>(options.id));
        let cell: Arc<OnceCell<T>> = self.get_or_insert_with(&slot, OnceCell::new);
        let abandon = Abandon {
            registry: self,
            slot: &slot,
            cell: &cell,
        };

        let mut ran = false;
        let value = cell
            .get_or_init(|| {
                ran = true;
                operation()
            })
            .await
            .clone();
        drop(abandon);

        if ran {
            self.release_pending(slot, cell, options.cache_time);
        } else {
            trace!(slot = ?slot, "joined pending operation");
        }
        value
    }

    fn release_pending<T>(&self, slot: Slot, cell: Arc<OnceCell<T>>, cache_time: Option<Duration>)
    where
        T: Send + Sync + 'static,
    {
        match cache_time {
            None => {
                self.remove_if_same(&slot, &cell);
            }
            Some(delay) => {
                let registry = self.clone();
                debug!(slot = ?slot, ?delay, "keeping finished result");
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    registry.remove_if_same(&slot, &cell);
                });
            }
        }
    }
}

/// Drops an unfinished slot that no other caller holds when a caller goes away
/// before the operation completes.
struct Abandon<'a, T>
where
    T: Send + Sync + 'static,
{
    registry: &'a Registry,
    slot: &'a Slot,
    cell: &'a Arc<OnceCell<T>>,
}

impl<T> Drop for Abandon<'_, T>
where
    T: Send + Sync + 'static,
{
    fn drop(&mut self) {
        if self.cell.initialized() {
            return;
        }
        let cell = self.cell;
        // Runs under the registry lock, so no new caller can clone the cell meanwhile
        let removed = self.registry.remove_where::<OnceCell<T>, _>(self.slot, |stored| {
            std::ptr::eq(stored, Arc::as_ptr(cell)) && Arc::strong_count(cell) == 2
        });
        if removed {
            debug!(slot = ?self.slot, "abandoned pending operation");
        }
    }
}
