//! Execution details of every submitted task.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::watch;

use crate::domain::{TaskExecutionDetails, TaskId};

struct Slot {
    /// Submission order.
    seq: u64,
    details: watch::Sender<TaskExecutionDetails>,
}

/// Result of applying a transition to a slot.
#[derive(Debug)]
pub(crate) struct Applied {
    pub(crate) details: TaskExecutionDetails,
    pub(crate) changed: bool,
}

/// One watch slot per task. Details are replaced, never mutated: a
/// transition computes the next value from the current one under the slot's
/// lock, and waiters are woken only when it actually changed.
#[derive(Default)]
pub(crate) struct DetailsDirectory {
    slots: DashMap<TaskId, Slot>,
    next_seq: AtomicU64,
}

impl DetailsDirectory {
    pub(crate) fn insert(&self, details: TaskExecutionDetails) {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.slots.insert(
            details.task_id(),
            Slot {
                seq,
                details: watch::Sender::new(details),
            },
        );
    }

    pub(crate) fn remove(&self, task_id: TaskId) {
        self.slots.remove(&task_id);
    }

    /// Applies `transition` to the current details of `task_id`. `None` for
    /// unknown ids.
    pub(crate) fn update(
        &self,
        task_id: TaskId,
        transition: impl FnOnce(&TaskExecutionDetails) -> TaskExecutionDetails,
    ) -> Option<Applied> {
        let slot = self.slots.get(&task_id)?;
        let mut after = None;
        let changed = slot.details.send_if_modified(|current| {
            let next = transition(current);
            let changed = next != *current;
            if changed {
                *current = next;
            }
            after = Some(current.clone());
            changed
        });
        after.map(|details| Applied { details, changed })
    }

    pub(crate) fn get(&self, task_id: TaskId) -> Option<TaskExecutionDetails> {
        self.slots
            .get(&task_id)
            .map(|slot| slot.details.borrow().clone())
    }

    pub(crate) fn subscribe(&self, task_id: TaskId) -> Option<watch::Receiver<TaskExecutionDetails>> {
        self.slots.get(&task_id).map(|slot| slot.details.subscribe())
    }

    /// Snapshot in submission order.
    pub(crate) fn list(&self) -> Vec<TaskExecutionDetails> {
        let mut entries: Vec<(u64, TaskExecutionDetails)> = self
            .slots
            .iter()
            .map(|slot| (slot.seq, slot.details.borrow().clone()))
            .collect();
        entries.sort_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, details)| details).collect()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}
