//! Running one task body and turning the way it ended into listener calls.

use std::any::Any;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::domain::{TaskError, TaskResult, TaskWithId};
use crate::ports::Listener;

/// How an execution ended.
#[derive(Debug)]
pub(crate) enum Outcome {
    Finished(TaskResult),
    Cancelled,
    Failed(TaskError),
    /// The worker was closed while the task ran; its result is lost.
    Shutdown,
}

/// Runs the task body on its own tokio task so a panic is contained.
///
/// When `cancellation` fires the body is aborted: its future is dropped at
/// the next suspension point.
pub(crate) async fn run(
    task: &TaskWithId,
    cancellation: &CancellationToken,
    shutdown: &CancellationToken,
) -> Outcome {
    let runnable = Arc::clone(task.task());
    let token = cancellation.clone();
    let mut handle = tokio::spawn(async move { runnable.run(token).await });

    let joined = tokio::select! {
        joined = &mut handle => joined,
        _ = cancellation.cancelled() => {
            handle.abort();
            handle.await
        }
    };

    if shutdown.is_cancelled() {
        return Outcome::Shutdown;
    }
    // once a cancel was requested, nothing else is reported
    if cancellation.is_cancelled() {
        return Outcome::Cancelled;
    }

    match joined {
        Ok(Ok(result)) => Outcome::Finished(result),
        Ok(Err(TaskError::Interrupted)) => Outcome::Finished(TaskResult::Partial),
        Ok(Err(err)) => Outcome::Failed(err),
        Err(join_error) if join_error.is_panic() => Outcome::Failed(TaskError::failed(format!(
            "task panicked: {}",
            panic_message(join_error.into_panic())
        ))),
        Err(_) => Outcome::Shutdown,
    }
}

/// Forwards an outcome to the listener.
pub(crate) fn report(
    task: &TaskWithId,
    outcome: Outcome,
    partial_as_failure: bool,
    listener: &dyn Listener,
) {
    let task_id = task.id();
    match outcome {
        Outcome::Finished(TaskResult::Completed) => {
            info!("task completed");
            listener.completed(task_id, TaskResult::Completed);
        }
        Outcome::Finished(TaskResult::Partial) if partial_as_failure => {
            warn!("task ended partially, reported as failed");
            listener.failed(task_id);
        }
        Outcome::Finished(TaskResult::Partial) => {
            warn!("task ended partially");
            listener.completed(task_id, TaskResult::Partial);
        }
        Outcome::Cancelled => {
            info!("task cancelled");
            listener.cancelled(task_id);
        }
        Outcome::Failed(cause) => {
            error!(error = %cause, "task failed");
            listener.failed_with_cause(task_id, &cause);
        }
        Outcome::Shutdown => {
            warn!("worker closed while task was running, result discarded");
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
