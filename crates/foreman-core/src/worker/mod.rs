//! Workers: components that actually run tasks and report lifecycle events.
//!
//! - [`SerialWorker`]: one task at a time (default).
//! - [`PooledWorker`]: up to `size` tasks concurrently.

mod execution;
mod pooled;
mod registry;
mod serial;

pub use pooled::PooledWorker;
pub use serial::SerialWorker;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::WorkerStrategy;
use crate::domain::{TaskId, TaskWithId};
use crate::ports::Listener;

/// Executes dispatched tasks.
///
/// The work queue awaits `execute_task` for every dispatch, in submission
/// order. A serial worker returns once the task reached an outcome; a pooled
/// worker returns once the task was handed to a free slot.
#[async_trait]
pub trait TaskManagerWorker: Send + Sync {
    async fn execute_task(&self, task: TaskWithId, listener: Arc<dyn Listener>);

    /// Best effort: a queued id is skipped at dispatch, a running one is
    /// interrupted. Never blocks.
    fn cancel_task(&self, task_id: TaskId);

    /// Stops accepting work and force-stops running tasks. Their results
    /// are not reported.
    fn close(&self);
}

/// Builds the worker described by `strategy`.
pub fn from_strategy(strategy: &WorkerStrategy, partial_as_failure: bool) -> Arc<dyn TaskManagerWorker> {
    match *strategy {
        WorkerStrategy::Serial => Arc::new(SerialWorker::new(partial_as_failure)),
        WorkerStrategy::Pooled { size } => Arc::new(PooledWorker::new(size, partial_as_failure)),
    }
}
