//! Bookkeeping shared by the worker strategies: which tasks are running and
//! which ids were cancelled before they got a chance to run.

use std::sync::Arc;

use dashmap::{DashMap, DashSet};
use tokio_util::sync::CancellationToken;

use crate::domain::TaskId;

/// Running handles and pending cancellations.
///
/// Ordering protocol: [`register`](Self::register) inserts the running
/// handle *before* checking the cancelled set, and [`cancel`](Self::cancel)
/// inserts into the cancelled set *before* looking up the running handle.
/// Whichever side comes second observes the other, so a cancellation can
/// never fall between the pre-check and the registration.
#[derive(Default)]
pub(crate) struct CancellationRegistry {
    running: DashMap<TaskId, CancellationToken>,
    cancelled: DashSet<TaskId>,
}

impl CancellationRegistry {
    /// Returns `None` when the id was cancelled before registration. The
    /// handle is released when the returned guard drops.
    pub(crate) fn register(
        self: &Arc<Self>,
        task_id: TaskId,
        cancellation: CancellationToken,
    ) -> Option<Registration> {
        self.running.insert(task_id, cancellation);
        if self.cancelled.remove(&task_id).is_some() {
            self.running.remove(&task_id);
            return None;
        }
        Some(Registration {
            registry: Arc::clone(self),
            task_id,
        })
    }

    /// Marks `task_id` cancelled and interrupts it if it is running.
    /// Returns whether a running handle was interrupted.
    pub(crate) fn cancel(&self, task_id: TaskId) -> bool {
        self.cancelled.insert(task_id);
        match self.running.get(&task_id) {
            Some(cancellation) => {
                cancellation.cancel();
                true
            }
            None => false,
        }
    }

    pub(crate) fn running_count(&self) -> usize {
        self.running.len()
    }

    fn release(&self, task_id: TaskId) {
        self.running.remove(&task_id);
        self.cancelled.remove(&task_id);
    }
}

/// Keeps a task registered as running; released on drop, whatever way the
/// execution exits.
pub(crate) struct Registration {
    registry: Arc<CancellationRegistry>,
    task_id: TaskId,
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.release(self.task_id);
    }
}
