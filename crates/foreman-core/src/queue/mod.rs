//! Work queue: decouples submission from execution.
//!
//! Submissions are dispatched to the worker one at a time, in the order they
//! were submitted, by a single consumer task. Ids still waiting in the queue
//! can be cancelled without ever reaching the worker.

mod channel;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use tokio::sync::watch;
use tracing::{debug, info};

use self::channel::{Dispatch, DispatchReceiver, DispatchSender};
use crate::domain::{TaskId, TaskWithId};
use crate::error::ForemanError;
use crate::ports::Listener;
use crate::worker::TaskManagerWorker;

/// FIFO queue in front of a [`TaskManagerWorker`].
///
/// - `shutdown_tx` で consumer を止める（`close()` / drop 時）
/// - `pending`: queue に入っていてまだ dispatch されていない id と、
///   dispatch 前に cancel されたかどうかのフラグ
pub struct WorkQueue {
    sender: DispatchSender,
    pending: Arc<DashMap<TaskId, bool>>,
    worker: Arc<dyn TaskManagerWorker>,
    shutdown_tx: watch::Sender<bool>,
    closed: AtomicBool,
}

impl WorkQueue {
    /// Spawns the consumer. Must be called within a Tokio runtime.
    ///
    /// `capacity` bounds the number of queued submissions; `None` is
    /// unbounded.
    pub fn start(worker: Arc<dyn TaskManagerWorker>, capacity: Option<usize>) -> Self {
        let (sender, receiver) = channel::channel(capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let pending = Arc::new(DashMap::new());

        tokio::spawn(consume(
            receiver,
            Arc::clone(&pending),
            Arc::clone(&worker),
            shutdown_rx,
        ));

        Self {
            sender,
            pending,
            worker,
            shutdown_tx,
            closed: AtomicBool::new(false),
        }
    }

    /// Enqueues a task. Waits for room when the queue is bounded.
    pub async fn submit(
        &self,
        task: TaskWithId,
        listener: Arc<dyn Listener>,
    ) -> Result<(), ForemanError> {
        if self.is_closed() {
            return Err(ForemanError::QueueClosed);
        }

        let task_id = task.id();
        // registered before sending: the consumer may dequeue immediately
        self.pending.insert(task_id, false);
        if self.sender.send(Dispatch { task, listener }).await.is_err() {
            self.pending.remove(&task_id);
            return Err(ForemanError::QueueClosed);
        }

        debug!(task_id = %task_id, "task queued");
        Ok(())
    }

    /// Skips the task at dispatch if it is still queued, otherwise asks the
    /// worker to interrupt it.
    pub fn cancel(&self, task_id: TaskId) {
        if let Some(mut cancelled) = self.pending.get_mut(&task_id) {
            *cancelled = true;
            debug!(task_id = %task_id, "queued task marked cancelled");
            return;
        }
        self.worker.cancel_task(task_id);
    }

    /// Number of submissions not dispatched yet.
    pub fn queued_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Stops the consumer, rejects further submissions and closes the
    /// worker. Idempotent.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        // ignore send error: the consumer may already be gone
        let _ = self.shutdown_tx.send(true);
        self.worker.close();
        info!(left_queued = self.pending.len(), "work queue closed");
    }
}

impl Drop for WorkQueue {
    fn drop(&mut self) {
        self.close();
    }
}

async fn consume(
    mut receiver: DispatchReceiver,
    pending: Arc<DashMap<TaskId, bool>>,
    worker: Arc<dyn TaskManagerWorker>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        // recv は「待つ」ので shutdown と競合させる
        let dispatch = tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
            dispatch = receiver.recv() => dispatch,
        };

        let Some(Dispatch { task, listener }) = dispatch else {
            break;
        };

        let task_id = task.id();
        let cancelled = pending
            .remove(&task_id)
            .map(|(_, cancelled)| cancelled)
            .unwrap_or(false);
        if cancelled {
            info!(task_id = %task_id, "task cancelled before dispatch");
            listener.cancelled(task_id);
            continue;
        }

        worker.execute_task(task, listener).await;
    }
    debug!("work queue consumer stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskResult;
    use crate::tasks::{CompletedTask, MemoryReferenceTask};
    use crate::worker::SerialWorker;
    use crate::worker::testing::{Event, RecordingListener};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;
    use ulid::Ulid;

    fn with_id(task: impl crate::domain::Task) -> TaskWithId {
        TaskWithId::new(TaskId::from_ulid(Ulid::new()), Arc::new(task))
    }

    fn serial_queue(capacity: Option<usize>) -> WorkQueue {
        WorkQueue::start(Arc::new(SerialWorker::default()), capacity)
    }

    /// A task that signals `started` and then runs until `release` fires.
    fn latched(started: &CancellationToken, release: &CancellationToken) -> TaskWithId {
        let (started, release) = (started.clone(), release.clone());
        with_id(MemoryReferenceTask::new(move |_| {
            let (started, release) = (started.clone(), release.clone());
            async move {
                started.cancel();
                release.cancelled().await;
                Ok(TaskResult::Completed)
            }
        }))
    }

    async fn wait_until(listener: &RecordingListener, expected: Event) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while !listener.events().contains(&expected) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("{expected:?} never happened: {:?}", listener.events()));
    }

    #[tokio::test]
    async fn dispatches_in_submission_order() {
        let queue = serial_queue(None);
        let listener = Arc::new(RecordingListener::default());
        let tasks: Vec<TaskWithId> = (0..5).map(|_| with_id(CompletedTask)).collect();
        let ids: Vec<TaskId> = tasks.iter().map(TaskWithId::id).collect();

        for task in tasks {
            queue.submit(task, listener.clone()).await.unwrap();
        }
        wait_until(&listener, Event::Completed(ids[4], TaskResult::Completed)).await;

        let started: Vec<TaskId> = listener
            .events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Started(id) => Some(id),
                _ => None,
            })
            .collect();
        assert_eq!(started, ids);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn queued_task_cancelled_before_dispatch_never_starts() {
        let queue = serial_queue(None);
        let listener = Arc::new(RecordingListener::default());
        let (started, release) = (CancellationToken::new(), CancellationToken::new());
        let blocker = latched(&started, &release);
        let queued = with_id(CompletedTask);
        let queued_id = queued.id();

        queue.submit(blocker, listener.clone()).await.unwrap();
        started.cancelled().await;
        queue.submit(queued, listener.clone()).await.unwrap();
        assert_eq!(queue.queued_count(), 1);

        queue.cancel(queued_id);
        release.cancel();
        wait_until(&listener, Event::Cancelled(queued_id)).await;

        assert_eq!(listener.events_for(queued_id), vec![Event::Cancelled(queued_id)]);
        assert_eq!(queue.queued_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cancel_of_running_task_reaches_worker() {
        let queue = serial_queue(None);
        let listener = Arc::new(RecordingListener::default());
        let (started, release) = (CancellationToken::new(), CancellationToken::new());
        let task = latched(&started, &release);
        let id = task.id();

        queue.submit(task, listener.clone()).await.unwrap();
        started.cancelled().await;
        queue.cancel(id);
        wait_until(&listener, Event::Cancelled(id)).await;

        assert_eq!(
            listener.events_for(id),
            vec![Event::Started(id), Event::Cancelled(id)]
        );
    }

    #[tokio::test]
    async fn submit_after_close_is_rejected() {
        let queue = serial_queue(Some(4));
        queue.close();
        queue.close();

        let err = queue
            .submit(with_id(CompletedTask), Arc::new(RecordingListener::default()))
            .await
            .unwrap_err();

        assert!(matches!(err, ForemanError::QueueClosed));
        assert!(queue.is_closed());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn bounded_queue_accepts_more_than_capacity_over_time() {
        let queue = serial_queue(Some(1));
        let listener = Arc::new(RecordingListener::default());
        let tasks: Vec<TaskWithId> = (0..4).map(|_| with_id(CompletedTask)).collect();
        let last = tasks[3].id();

        for task in tasks {
            queue.submit(task, listener.clone()).await.unwrap();
        }
        wait_until(&listener, Event::Completed(last, TaskResult::Completed)).await;
    }
}
