//! Reference tasks.
//!
//! Small tasks with fixed behaviour, used to exercise the engine from tests
//! and from the command line.

mod memory_reference;

pub use memory_reference::{BoxTaskFuture, MemoryReferenceTask, MemoryReferenceWithCounterTask};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::{Task, TaskError, TaskResult, TaskType};

/// Completes immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletedTask;

#[async_trait]
impl Task for CompletedTask {
    async fn run(&self, _cancellation: CancellationToken) -> Result<TaskResult, TaskError> {
        Ok(TaskResult::Completed)
    }

    fn task_type(&self) -> TaskType {
        TaskType::new("completed-task")
    }
}

/// Ends with a `Partial` result.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailedTask;

#[async_trait]
impl Task for FailedTask {
    async fn run(&self, _cancellation: CancellationToken) -> Result<TaskResult, TaskError> {
        Ok(TaskResult::Partial)
    }

    fn task_type(&self) -> TaskType {
        TaskType::new("failed-task")
    }
}

/// Returns an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThrowingTask;

#[async_trait]
impl Task for ThrowingTask {
    async fn run(&self, _cancellation: CancellationToken) -> Result<TaskResult, TaskError> {
        Err(TaskError::failed("Throwing task does throw"))
    }

    fn task_type(&self) -> TaskType {
        TaskType::new("throwing-task")
    }
}
