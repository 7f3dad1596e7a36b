//! One repeating timer per id.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::{Id, Namespace, Registry, Slot, Tag, WeakRegistry};

/// Registry entry for a running timer. Dropping it stops the task.
struct TimerEntry {
    generation: u64,
    abort: AbortHandle,
}

impl Drop for TimerEntry {
    fn drop(&mut self) {
        self.abort.abort();
    }
}

impl Registry {
    /// Calls `tick` every `period` until cancelled, replacing any timer
    /// already running for `id`.
    ///
    /// The first call happens one `period` after this returns. A blank id is
    /// treated as `"default"`.
    ///
    /// # Panics
    /// Panics if `period` is zero, or if called outside a tokio runtime.
    ///
    /// # Example
    /// ```ignore
    /// let handle = registry.run_interval("heartbeat", Duration::from_secs(5), || ping());
    /// // Later:
    /// handle.cancel();
    /// ```
    pub fn run_interval<F>(&self, id: impl Into<Id>, period: Duration, mut tick: F) -> IntervalHandle
    where
        F: FnMut() + Send + 'static,
    {
        assert!(!period.is_zero(), "run_interval: `period` must be non-zero");
        let id = id.into().or_default();
        let slot = timer_slot(id.clone());
        let generation = self.next_generation();

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                tick();
            }
        });
        let abort = task.abort_handle();

        // Dropping the replaced entry aborts the previous timer
        self.replace(
            slot.clone(),
            Arc::new(TimerEntry {
                generation,
                abort: abort.clone(),
            }),
        );
        info!(%id, ?period, "interval started");

        IntervalHandle {
            registry: self.downgrade(),
            slot,
            generation,
            abort,
        }
    }

    /// Returns true if a timer is running for `id`.
    pub fn is_interval_active(&self, id: impl Into<Id>) -> bool {
        self.lookup::<TimerEntry>(&timer_slot(id.into().or_default()))
            .map_or(false, |entry| !entry.abort.is_finished())
    }
}

fn timer_slot(id: Id) -> Slot {
    Slot::new::<TimerEntry>(Namespace::Timer, Tag::Id(id))
}

// == Interval Handle ==
/// Stops the timer started by [`Registry::run_interval`].
///
/// Dropping the handle leaves the timer running.
#[derive(Debug)]
pub struct IntervalHandle {
    registry: WeakRegistry,
    slot: Slot,
    generation: u64,
    abort: AbortHandle,
}

impl IntervalHandle {
    /// Stops the timer and frees its id.
    ///
    /// If the id has since been taken by a newer timer, that timer is left
    /// alone.
    pub fn cancel(&self) {
        self.abort.abort();

        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let generation = self.generation;
        if registry.remove_where::<TimerEntry, _>(&self.slot, |entry| entry.generation == generation) {
            debug!(slot = ?self.slot, "interval cancelled");
        }
    }

    /// Returns true once the timer task has stopped.
    pub fn is_finished(&self) -> bool {
        self.abort.is_finished()
    }
}
