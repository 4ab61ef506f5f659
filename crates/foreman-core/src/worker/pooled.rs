//! Bounded pool of concurrently running tasks.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use super::execution;
use super::registry::CancellationRegistry;
use super::TaskManagerWorker;
use crate::domain::{TaskId, TaskWithId};
use crate::ports::Listener;

/// Runs up to `size` tasks at the same time, each on its own tokio task.
///
/// `execute_task` waits for a free slot, then hands the task off and
/// returns; the slot is held until the task reaches an outcome.
pub struct PooledWorker {
    slots: Arc<Semaphore>,
    size: usize,
    registry: Arc<CancellationRegistry>,
    shutdown: CancellationToken,
    partial_as_failure: bool,
}

impl PooledWorker {
    pub fn new(size: usize, partial_as_failure: bool) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(size)),
            size,
            registry: Arc::new(CancellationRegistry::default()),
            shutdown: CancellationToken::new(),
            partial_as_failure,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn running_count(&self) -> usize {
        self.registry.running_count()
    }
}

#[async_trait]
impl TaskManagerWorker for PooledWorker {
    async fn execute_task(&self, task: TaskWithId, listener: Arc<dyn Listener>) {
        let task_id = task.id();
        let span = info_span!("task", task_id = %task_id, task_type = %task.task().task_type());

        let Ok(permit) = Arc::clone(&self.slots).acquire_owned().await else {
            warn!(parent: &span, "worker closed, task not executed");
            return;
        };

        let cancellation = self.shutdown.child_token();
        let Some(registration) = self.registry.register(task_id, cancellation.clone()) else {
            info!(parent: &span, "task cancelled before start");
            listener.cancelled(task_id);
            return;
        };

        debug!(parent: &span, available = self.slots.available_permits(), "slot acquired");
        listener.started(task_id);

        let shutdown = self.shutdown.clone();
        let partial_as_failure = self.partial_as_failure;
        tokio::spawn(
            async move {
                let _permit = permit;
                let outcome = execution::run(&task, &cancellation, &shutdown).await;
                drop(registration);
                execution::report(&task, outcome, partial_as_failure, listener.as_ref());
            }
            .instrument(span),
        );
    }

    fn cancel_task(&self, task_id: TaskId) {
        if self.registry.cancel(task_id) {
            info!(task_id = %task_id, "interrupting running task");
        }
    }

    fn close(&self) {
        self.slots.close();
        self.shutdown.cancel();
    }
}
