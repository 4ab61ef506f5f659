//! Task contract: the unit of work handed to the engine.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::TaskId;

/// Label describing what kind of work a task performs (e.g. `"reindex"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskType(String);

impl TaskType {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Outcome of a run that returned normally.
///
/// `Partial` means the task reached its end but could not guarantee that
/// every item was processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskResult {
    Completed,
    Partial,
}

impl TaskResult {
    /// `Completed` only when both sides are `Completed`.
    pub fn combine(self, other: TaskResult) -> TaskResult {
        match (self, other) {
            (TaskResult::Completed, TaskResult::Completed) => TaskResult::Completed,
            _ => TaskResult::Partial,
        }
    }

    /// Folds a sequence of results; an empty sequence is `Completed`.
    pub fn combine_all(results: impl IntoIterator<Item = TaskResult>) -> TaskResult {
        results
            .into_iter()
            .fold(TaskResult::Completed, TaskResult::combine)
    }

    pub fn is_completed(self) -> bool {
        self == TaskResult::Completed
    }
}

/// Error raised by a task body.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The task observed its cancellation token and stopped early.
    #[error("task interrupted")]
    Interrupted,

    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl TaskError {
    pub fn failed(message: impl Into<String>) -> Self {
        TaskError::Failed(message.into())
    }
}

/// A unit of work.
///
/// `run` performs the whole operation. It is handed a [`CancellationToken`]
/// that is triggered when a cancel is requested; well-behaved tasks check it
/// between steps and return [`TaskError::Interrupted`]. The worker also
/// drops the running future on cancellation, so code after the next
/// suspension point never runs once a cancel is observed.
///
/// `details` is polled by observers while `run` executes and must therefore
/// only read state that is safe to share (atomics, locks, snapshots).
///
/// # Example
/// ```ignore
/// struct Reindex { processed: AtomicU64 }
///
/// #[async_trait]
/// impl Task for Reindex {
///     async fn run(&self, cancellation: CancellationToken) -> Result<TaskResult, TaskError> {
///         for mailbox in mailboxes() {
///             if cancellation.is_cancelled() {
///                 return Err(TaskError::Interrupted);
///             }
///             reindex(mailbox).await?;
///             self.processed.fetch_add(1, Ordering::Relaxed);
///         }
///         Ok(TaskResult::Completed)
///     }
///
///     fn task_type(&self) -> TaskType {
///         TaskType::new("reindex")
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send + Sync + 'static {
    async fn run(&self, cancellation: CancellationToken) -> Result<TaskResult, TaskError>;

    fn task_type(&self) -> TaskType;

    /// Progress snapshot, if the task reports any.
    fn details(&self) -> Option<serde_json::Value> {
        None
    }
}

/// A task paired with the id it was submitted under.
#[derive(Clone)]
pub struct TaskWithId {
    id: TaskId,
    task: Arc<dyn Task>,
}

impl TaskWithId {
    pub fn new(id: TaskId, task: Arc<dyn Task>) -> Self {
        Self { id, task }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn task(&self) -> &Arc<dyn Task> {
        &self.task
    }
}

impl fmt::Debug for TaskWithId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskWithId")
            .field("id", &self.id)
            .field("task_type", &self.task.task_type())
            .finish()
    }
}
