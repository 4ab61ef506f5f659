//! Tasks backed by an in-memory closure.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::{Task, TaskError, TaskResult, TaskType};

/// Boxed future returned by a task closure.
pub type BoxTaskFuture = Pin<Box<dyn Future<Output = Result<TaskResult, TaskError>> + Send + 'static>>;

type RunFn = Box<dyn Fn(CancellationToken) -> BoxTaskFuture + Send + Sync>;
type CounterRunFn = Box<dyn Fn(Arc<AtomicU64>, CancellationToken) -> BoxTaskFuture + Send + Sync>;

/// Runs a closure.
///
/// # Example
/// ```ignore
/// let task = MemoryReferenceTask::new(|_cancellation| async {
///     tokio::time::sleep(Duration::from_millis(50)).await;
///     Ok(TaskResult::Completed)
/// });
/// ```
pub struct MemoryReferenceTask {
    run: RunFn,
}

impl MemoryReferenceTask {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<TaskResult, TaskError>> + Send + 'static,
    {
        Self {
            run: Box::new(move |cancellation| Box::pin(f(cancellation))),
        }
    }
}

#[async_trait]
impl Task for MemoryReferenceTask {
    async fn run(&self, cancellation: CancellationToken) -> Result<TaskResult, TaskError> {
        (self.run)(cancellation).await
    }

    fn task_type(&self) -> TaskType {
        TaskType::new("memory-reference-task")
    }
}

/// Runs a closure that is handed a shared counter. The counter is exposed
/// as `{"count": n}` through [`Task::details`], so progress can be observed
/// while the closure runs.
pub struct MemoryReferenceWithCounterTask {
    run: CounterRunFn,
    counter: Arc<AtomicU64>,
}

impl MemoryReferenceWithCounterTask {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Arc<AtomicU64>, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<TaskResult, TaskError>> + Send + 'static,
    {
        Self {
            run: Box::new(move |counter, cancellation| Box::pin(f(counter, cancellation))),
            counter: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn count(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Task for MemoryReferenceWithCounterTask {
    async fn run(&self, cancellation: CancellationToken) -> Result<TaskResult, TaskError> {
        (self.run)(Arc::clone(&self.counter), cancellation).await
    }

    fn task_type(&self) -> TaskType {
        TaskType::new("memory-reference-task-with-counter")
    }

    fn details(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({ "count": self.count() }))
    }
}
