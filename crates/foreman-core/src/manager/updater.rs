use std::sync::Arc;

use tracing::debug;

use super::directory::DetailsDirectory;
use crate::domain::{TaskError, TaskExecutionDetails, TaskId, TaskResult};
use crate::ports::{Clock, Listener};

/// Applies worker lifecycle events to the details directory.
pub(crate) struct DetailsUpdater {
    directory: Arc<DetailsDirectory>,
    clock: Arc<dyn Clock>,
}

impl DetailsUpdater {
    pub(crate) fn new(directory: Arc<DetailsDirectory>, clock: Arc<dyn Clock>) -> Self {
        Self { directory, clock }
    }

    fn apply(
        &self,
        task_id: TaskId,
        event: &'static str,
        transition: impl FnOnce(&TaskExecutionDetails) -> TaskExecutionDetails,
    ) {
        match self.directory.update(task_id, transition) {
            Some(applied) if !applied.changed => {
                debug!(task_id = %task_id, event, status = %applied.details.status(), "event ignored");
            }
            Some(applied) => {
                debug!(task_id = %task_id, event, status = %applied.details.status(), "details updated");
            }
            None => debug!(task_id = %task_id, event, "event for unknown task"),
        }
    }
}

impl Listener for DetailsUpdater {
    fn started(&self, task_id: TaskId) {
        let now = self.clock.now();
        self.apply(task_id, "started", |d| d.start(now));
    }

    fn completed(&self, task_id: TaskId, result: TaskResult) {
        let now = self.clock.now();
        self.apply(task_id, "completed", |d| d.completed(now, result));
    }

    fn failed(&self, task_id: TaskId) {
        let now = self.clock.now();
        self.apply(task_id, "failed", |d| d.failed(now));
    }

    fn failed_with_cause(&self, task_id: TaskId, _cause: &TaskError) {
        // cause is logged by the worker
        let now = self.clock.now();
        self.apply(task_id, "failed", |d| d.failed(now));
    }

    fn cancelled(&self, task_id: TaskId) {
        let now = self.clock.now();
        self.apply(task_id, "cancelled", |d| d.cancel_effectively(now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Status;
    use crate::ports::FixedClock;
    use crate::tasks::CompletedTask;
    use chrono::{TimeZone, Utc};
    use ulid::Ulid;

    fn setup() -> (Arc<DetailsDirectory>, DetailsUpdater, TaskId) {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        ));
        let directory = Arc::new(DetailsDirectory::default());
        let id = TaskId::from_ulid(Ulid::new());
        directory.insert(TaskExecutionDetails::waiting(
            id,
            Arc::new(CompletedTask),
            clock.now(),
        ));
        let updater = DetailsUpdater::new(Arc::clone(&directory), clock);
        (directory, updater, id)
    }

    #[test]
    fn started_then_completed() {
        let (directory, updater, id) = setup();

        updater.started(id);
        updater.completed(id, TaskResult::Partial);

        let details = directory.get(id).unwrap();
        assert_eq!(details.status(), Status::Completed);
        assert_eq!(details.result(), Some(TaskResult::Partial));
        assert!(details.started_at().is_some());
        assert!(details.completed_at().is_some());
    }

    #[test]
    fn second_terminal_event_is_absorbed() {
        let (directory, updater, id) = setup();

        updater.started(id);
        updater.failed_with_cause(id, &TaskError::failed("boom"));
        updater.cancelled(id);

        let details = directory.get(id).unwrap();
        assert_eq!(details.status(), Status::Failed);
        assert!(details.canceled_at().is_none());
    }

    #[test]
    fn unknown_task_is_ignored() {
        let (directory, updater, _) = setup();

        updater.started(TaskId::from_ulid(Ulid::new()));

        assert_eq!(directory.len(), 1);
    }
}
