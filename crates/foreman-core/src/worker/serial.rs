//! Serialized single-slot worker.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info, info_span, warn};

use super::execution;
use super::registry::CancellationRegistry;
use super::TaskManagerWorker;
use crate::domain::{TaskId, TaskWithId};
use crate::ports::Listener;

/// Runs one task at a time.
///
/// Flow of `execute_task`:
/// 1. acquire the single permit (never contended behind the single-consumer
///    work queue, since dispatch is already serial)
/// 2. skip the task and report `cancelled` if it was cancelled before start
/// 3. run it, keeping its cancellation handle registered
/// 4. report the outcome
///
/// The permit and the registration are guards, released on every exit path.
pub struct SerialWorker {
    permit: Semaphore,
    registry: Arc<CancellationRegistry>,
    shutdown: CancellationToken,
    partial_as_failure: bool,
}

impl SerialWorker {
    pub fn new(partial_as_failure: bool) -> Self {
        Self {
            permit: Semaphore::new(1),
            registry: Arc::new(CancellationRegistry::default()),
            shutdown: CancellationToken::new(),
            partial_as_failure,
        }
    }

    /// Number of tasks currently executing (0 or 1).
    pub fn running_count(&self) -> usize {
        self.registry.running_count()
    }
}

impl Default for SerialWorker {
    fn default() -> Self {
        Self::new(false)
    }
}

#[async_trait]
impl TaskManagerWorker for SerialWorker {
    async fn execute_task(&self, task: TaskWithId, listener: Arc<dyn Listener>) {
        let task_id = task.id();
        let span = info_span!("task", task_id = %task_id, task_type = %task.task().task_type());

        async {
            let Ok(_permit) = self.permit.acquire().await else {
                warn!("worker closed, task not executed");
                return;
            };

            let cancellation = self.shutdown.child_token();
            let Some(registration) = self.registry.register(task_id, cancellation.clone()) else {
                info!("task cancelled before start");
                listener.cancelled(task_id);
                return;
            };

            listener.started(task_id);
            let outcome = execution::run(&task, &cancellation, &self.shutdown).await;
            drop(registration);

            execution::report(&task, outcome, self.partial_as_failure, listener.as_ref());
        }
        .instrument(span)
        .await
    }

    fn cancel_task(&self, task_id: TaskId) {
        if self.registry.cancel(task_id) {
            info!(task_id = %task_id, "interrupting running task");
        }
    }

    fn close(&self) {
        self.permit.close();
        self.shutdown.cancel();
    }
}
