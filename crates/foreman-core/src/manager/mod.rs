//! The engine's façade.
//!
//! `TaskManager` assigns ids, keeps the execution details of every task it
//! was given, and feeds a [`WorkQueue`] / worker pair.

mod builder;
mod directory;
mod updater;

pub use builder::TaskManagerBuilder;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use self::directory::DetailsDirectory;
use self::updater::DetailsUpdater;
use crate::config::TaskManagerConfig;
use crate::domain::{Status, Task, TaskExecutionDetails, TaskId, TaskWithId};
use crate::error::ForemanError;
use crate::observability::StatusCounts;
use crate::ports::{Clock, IdGenerator, Listener};
use crate::queue::WorkQueue;
use crate::worker::TaskManagerWorker;

/// Accepts tasks, runs them through the configured worker and tracks their
/// lifecycle.
///
/// Details are kept for the lifetime of the manager. Dropping the manager
/// closes the queue and force-stops running tasks.
///
/// # Example
/// ```ignore
/// let manager = TaskManager::new(TaskManagerConfig::default())?;
/// let id = manager.submit(Reindex::new(mailbox)).await?;
/// let details = manager.wait_timeout(id, Duration::from_secs(60)).await?;
/// println!("{}", details.status());
/// ```
pub struct TaskManager {
    directory: Arc<DetailsDirectory>,
    listener: Arc<dyn Listener>,
    queue: WorkQueue,
    clock: Arc<dyn Clock>,
    id_generator: Arc<dyn IdGenerator>,
}

impl TaskManager {
    /// Manager with the system clock and ULID ids. Must be called within a
    /// Tokio runtime.
    pub fn new(config: TaskManagerConfig) -> Result<Self, ForemanError> {
        Self::builder().with_config(config).build()
    }

    pub fn builder() -> TaskManagerBuilder {
        TaskManagerBuilder::new()
    }

    fn assemble(
        clock: Arc<dyn Clock>,
        id_generator: Arc<dyn IdGenerator>,
        worker: Arc<dyn TaskManagerWorker>,
        queue_capacity: Option<usize>,
    ) -> Self {
        let directory = Arc::new(DetailsDirectory::default());
        let listener: Arc<dyn Listener> = Arc::new(DetailsUpdater::new(
            Arc::clone(&directory),
            Arc::clone(&clock),
        ));
        Self {
            directory,
            listener,
            queue: WorkQueue::start(worker, queue_capacity),
            clock,
            id_generator,
        }
    }

    pub async fn submit<T: Task>(&self, task: T) -> Result<TaskId, ForemanError> {
        self.submit_shared(Arc::new(task)).await
    }

    /// Records the task as `waiting` and enqueues it. Fails with
    /// [`ForemanError::QueueClosed`] once the manager is closed.
    pub async fn submit_shared(&self, task: Arc<dyn Task>) -> Result<TaskId, ForemanError> {
        let task_id = self.id_generator.generate_task_id();
        let task_type = task.task_type();

        self.directory.insert(TaskExecutionDetails::waiting(
            task_id,
            Arc::clone(&task),
            self.clock.now(),
        ));
        if let Err(err) = self
            .queue
            .submit(TaskWithId::new(task_id, task), Arc::clone(&self.listener))
            .await
        {
            self.directory.remove(task_id);
            return Err(err);
        }

        info!(task_id = %task_id, task_type = %task_type, "task submitted");
        Ok(task_id)
    }

    pub fn execution_details(&self, task_id: TaskId) -> Result<TaskExecutionDetails, ForemanError> {
        self.directory
            .get(task_id)
            .ok_or(ForemanError::TaskNotFound(task_id))
    }

    /// Snapshot of every known task, in submission order.
    pub fn list(&self) -> Vec<TaskExecutionDetails> {
        self.directory.list()
    }

    pub fn list_by_status(&self, status: Status) -> Vec<TaskExecutionDetails> {
        self.directory
            .list()
            .into_iter()
            .filter(|details| details.status() == status)
            .collect()
    }

    /// Requests cancellation. Unknown ids and tasks that already reached a
    /// terminal status are left untouched; repeating the request is a no-op.
    pub fn cancel(&self, task_id: TaskId) {
        let Some(applied) = self.directory.update(task_id, |d| d.cancel_requested()) else {
            debug!(task_id = %task_id, "cancel of unknown task ignored");
            return;
        };
        if !applied.changed {
            debug!(task_id = %task_id, status = %applied.details.status(), "cancel ignored");
            return;
        }

        info!(task_id = %task_id, "cancel requested");
        self.queue.cancel(task_id);
    }

    /// Waits until the task reaches a terminal status and returns its final
    /// details.
    pub async fn wait(&self, task_id: TaskId) -> Result<TaskExecutionDetails, ForemanError> {
        let mut rx = self
            .directory
            .subscribe(task_id)
            .ok_or(ForemanError::TaskNotFound(task_id))?;

        match rx.wait_for(|details| details.status().is_terminal()).await {
            Ok(details) => Ok(details.clone()),
            Err(_) => Err(ForemanError::TaskNotFound(task_id)),
        }
    }

    /// [`wait`](Self::wait), giving up after `timeout`.
    pub async fn wait_timeout(
        &self,
        task_id: TaskId,
        timeout: Duration,
    ) -> Result<TaskExecutionDetails, ForemanError> {
        match tokio::time::timeout(timeout, self.wait(task_id)).await {
            Ok(result) => result,
            Err(_) => Err(ForemanError::ReachedTimeout { task_id, timeout }),
        }
    }

    pub fn counts_by_status(&self) -> StatusCounts {
        self.directory
            .list()
            .iter()
            .map(TaskExecutionDetails::status)
            .collect()
    }

    /// Stops dispatching and force-stops running tasks. Tasks that did not
    /// reach a terminal status keep their last recorded status.
    pub fn close(&self) {
        self.queue.close();
    }

    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }
}
