//! Listener port - lifecycle callbacks from the worker to a details store.

use crate::domain::{TaskError, TaskId, TaskResult};

/// Receives lifecycle events for tasks run by a worker.
///
/// Exactly one terminal event (`completed`, `failed`, `failed_with_cause`,
/// `cancelled`) is emitted per task in normal operation, but implementations
/// must treat a second terminal event for the same id as a no-op.
pub trait Listener: Send + Sync {
    fn started(&self, task_id: TaskId);

    fn completed(&self, task_id: TaskId, result: TaskResult);

    /// The run ended without an error but is reported as a failure
    /// (a `Partial` result under `partial_as_failure`).
    fn failed(&self, task_id: TaskId);

    fn failed_with_cause(&self, task_id: TaskId, cause: &TaskError);

    fn cancelled(&self, task_id: TaskId);
}
