//! Execution details: the immutable lifecycle record of one task.
//!
//! Every transition is a pure function `&self -> Self`. When a transition
//! does not apply to the current status the returned value is equal to the
//! input, so racing callers (worker vs. cancel) can apply transitions without
//! coordinating; only the slot holding the current value needs atomic
//! replace-on-write.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Status, Task, TaskId, TaskResult, TaskType};

#[derive(Clone)]
pub struct TaskExecutionDetails {
    task_id: TaskId,
    task: Arc<dyn Task>,
    status: Status,
    submitted_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    canceled_at: Option<DateTime<Utc>>,
    failed_at: Option<DateTime<Utc>>,
    result: Option<TaskResult>,
}

impl TaskExecutionDetails {
    /// Details of a freshly submitted task.
    pub fn waiting(task_id: TaskId, task: Arc<dyn Task>, now: DateTime<Utc>) -> Self {
        Self {
            task_id,
            task,
            status: Status::Waiting,
            submitted_at: now,
            started_at: None,
            completed_at: None,
            canceled_at: None,
            failed_at: None,
            result: None,
        }
    }

    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    pub fn task(&self) -> &Arc<dyn Task> {
        &self.task
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn task_type(&self) -> TaskType {
        self.task.task_type()
    }

    /// Reads the task's live progress snapshot, even from a stale record.
    pub fn additional_information(&self) -> Option<serde_json::Value> {
        self.task.details()
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn canceled_at(&self) -> Option<DateTime<Utc>> {
        self.canceled_at
    }

    pub fn failed_at(&self) -> Option<DateTime<Utc>> {
        self.failed_at
    }

    /// Result reported by a completed run.
    pub fn result(&self) -> Option<TaskResult> {
        self.result
    }

    /// Waiting -> InProgress
    pub fn start(&self, now: DateTime<Utc>) -> Self {
        match self.status {
            Status::Waiting => Self {
                status: Status::InProgress,
                started_at: Some(now),
                ..self.clone()
            },
            _ => self.clone(),
        }
    }

    /// Waiting | InProgress -> CancelRequested
    pub fn cancel_requested(&self) -> Self {
        match self.status {
            Status::Waiting | Status::InProgress => Self {
                status: Status::CancelRequested,
                ..self.clone()
            },
            _ => self.clone(),
        }
    }

    /// Waiting | InProgress | CancelRequested -> Completed
    pub fn completed(&self, now: DateTime<Utc>, result: TaskResult) -> Self {
        match self.status {
            Status::Waiting | Status::InProgress | Status::CancelRequested => Self {
                status: Status::Completed,
                completed_at: Some(now),
                result: Some(result),
                ..self.clone()
            },
            _ => self.clone(),
        }
    }

    /// InProgress | CancelRequested -> Failed
    pub fn failed(&self, now: DateTime<Utc>) -> Self {
        match self.status {
            Status::InProgress | Status::CancelRequested => Self {
                status: Status::Failed,
                failed_at: Some(now),
                ..self.clone()
            },
            _ => self.clone(),
        }
    }

    /// Waiting | InProgress | CancelRequested -> Cancelled
    pub fn cancel_effectively(&self, now: DateTime<Utc>) -> Self {
        match self.status {
            Status::Waiting | Status::InProgress | Status::CancelRequested => Self {
                status: Status::Cancelled,
                canceled_at: Some(now),
                ..self.clone()
            },
            _ => self.clone(),
        }
    }

    /// Serializable projection for reporting layers.
    pub fn view(&self) -> DetailsView {
        DetailsView {
            task_id: self.task_id,
            task_type: self.task_type(),
            status: self.status,
            submitted_at: self.submitted_at,
            started_at: self.started_at,
            completed_at: self.completed_at,
            canceled_at: self.canceled_at,
            failed_at: self.failed_at,
            result: self.result,
            additional_information: self.additional_information(),
        }
    }
}

/// Two records are equal when they describe the same task instance in the
/// same lifecycle position.
impl PartialEq for TaskExecutionDetails {
    fn eq(&self, other: &Self) -> bool {
        self.task_id == other.task_id
            && Arc::ptr_eq(&self.task, &other.task)
            && self.status == other.status
            && self.submitted_at == other.submitted_at
            && self.started_at == other.started_at
            && self.completed_at == other.completed_at
            && self.canceled_at == other.canceled_at
            && self.failed_at == other.failed_at
            && self.result == other.result
    }
}

impl fmt::Debug for TaskExecutionDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskExecutionDetails")
            .field("task_id", &self.task_id)
            .field("task_type", &self.task_type())
            .field("status", &self.status)
            .field("submitted_at", &self.submitted_at)
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .field("canceled_at", &self.canceled_at)
            .field("failed_at", &self.failed_at)
            .field("result", &self.result)
            .finish()
    }
}

/// JSON view of [`TaskExecutionDetails`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailsView {
    pub task_id: TaskId,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub status: Status,
    pub submitted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canceled_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<TaskResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_information: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::CompletedTask;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;
    use ulid::Ulid;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn at(seconds: i64) -> DateTime<Utc> {
        t0() + Duration::seconds(seconds)
    }

    fn waiting() -> TaskExecutionDetails {
        TaskExecutionDetails::waiting(
            TaskId::from_ulid(Ulid::new()),
            Arc::new(CompletedTask),
            t0(),
        )
    }

    fn in_status(status: Status) -> TaskExecutionDetails {
        let d = waiting();
        match status {
            Status::Waiting => d,
            Status::InProgress => d.start(at(1)),
            Status::CancelRequested => d.start(at(1)).cancel_requested(),
            Status::Completed => d.start(at(1)).completed(at(2), TaskResult::Completed),
            Status::Cancelled => d.start(at(1)).cancel_effectively(at(2)),
            Status::Failed => d.start(at(1)).failed(at(2)),
        }
    }

    fn terminal_timestamps(d: &TaskExecutionDetails) -> usize {
        [d.completed_at(), d.canceled_at(), d.failed_at()]
            .iter()
            .filter(|t| t.is_some())
            .count()
    }

    #[test]
    fn new_details_are_waiting() {
        let d = waiting();
        assert_eq!(d.status(), Status::Waiting);
        assert_eq!(d.submitted_at(), t0());
        assert_eq!(d.started_at(), None);
        assert_eq!(terminal_timestamps(&d), 0);
        assert_eq!(d.task_type(), TaskType::new("completed-task"));
    }

    #[test]
    fn start_records_start_date() {
        let d = waiting().start(at(5));
        assert_eq!(d.status(), Status::InProgress);
        assert_eq!(d.started_at(), Some(at(5)));
    }

    #[test]
    fn completed_keeps_result() {
        let d = in_status(Status::InProgress).completed(at(9), TaskResult::Partial);
        assert_eq!(d.status(), Status::Completed);
        assert_eq!(d.completed_at(), Some(at(9)));
        assert_eq!(d.result(), Some(TaskResult::Partial));
    }

    #[rstest]
    #[case::waiting(Status::Waiting, Status::Completed)]
    #[case::in_progress(Status::InProgress, Status::Completed)]
    #[case::cancel_requested(Status::CancelRequested, Status::Completed)]
    #[case::completed(Status::Completed, Status::Completed)]
    #[case::cancelled(Status::Cancelled, Status::Cancelled)]
    #[case::failed(Status::Failed, Status::Failed)]
    fn completed_from(#[case] from: Status, #[case] expected: Status) {
        let d = in_status(from).completed(at(10), TaskResult::Completed);
        assert_eq!(d.status(), expected);
    }

    #[rstest]
    #[case::waiting(Status::Waiting, Status::Waiting)]
    #[case::in_progress(Status::InProgress, Status::Failed)]
    #[case::cancel_requested(Status::CancelRequested, Status::Failed)]
    #[case::completed(Status::Completed, Status::Completed)]
    #[case::cancelled(Status::Cancelled, Status::Cancelled)]
    #[case::failed(Status::Failed, Status::Failed)]
    fn failed_from(#[case] from: Status, #[case] expected: Status) {
        assert_eq!(in_status(from).failed(at(10)).status(), expected);
    }

    #[rstest]
    #[case::waiting(Status::Waiting, Status::Cancelled)]
    #[case::in_progress(Status::InProgress, Status::Cancelled)]
    #[case::cancel_requested(Status::CancelRequested, Status::Cancelled)]
    #[case::completed(Status::Completed, Status::Completed)]
    #[case::cancelled(Status::Cancelled, Status::Cancelled)]
    #[case::failed(Status::Failed, Status::Failed)]
    fn cancel_effectively_from(#[case] from: Status, #[case] expected: Status) {
        assert_eq!(in_status(from).cancel_effectively(at(10)).status(), expected);
    }

    #[rstest]
    #[case::waiting(Status::Waiting, Status::CancelRequested)]
    #[case::in_progress(Status::InProgress, Status::CancelRequested)]
    #[case::cancel_requested(Status::CancelRequested, Status::CancelRequested)]
    #[case::completed(Status::Completed, Status::Completed)]
    #[case::cancelled(Status::Cancelled, Status::Cancelled)]
    #[case::failed(Status::Failed, Status::Failed)]
    fn cancel_requested_from(#[case] from: Status, #[case] expected: Status) {
        assert_eq!(in_status(from).cancel_requested().status(), expected);
    }

    #[rstest]
    #[case::in_progress(Status::InProgress)]
    #[case::cancel_requested(Status::CancelRequested)]
    #[case::completed(Status::Completed)]
    #[case::cancelled(Status::Cancelled)]
    #[case::failed(Status::Failed)]
    fn start_only_applies_to_waiting(#[case] from: Status) {
        let d = in_status(from);
        assert_eq!(d.start(at(20)), d);
    }

    #[rstest]
    #[case::completed(Status::Completed)]
    #[case::cancelled(Status::Cancelled)]
    #[case::failed(Status::Failed)]
    fn transitions_leave_terminal_details_unchanged(#[case] from: Status) {
        let d = in_status(from);
        assert_eq!(d.start(at(20)), d);
        assert_eq!(d.cancel_requested(), d);
        assert_eq!(d.completed(at(20), TaskResult::Completed), d);
        assert_eq!(d.failed(at(20)), d);
        assert_eq!(d.cancel_effectively(at(20)), d);
    }

    #[test]
    fn failed_does_not_apply_to_waiting() {
        let d = waiting();
        assert_eq!(d.failed(at(3)), d);
    }

    #[test]
    fn at_most_one_terminal_timestamp_on_every_path() {
        for from in Status::ALL {
            let d = in_status(from);
            let candidates = [
                d.completed(at(30), TaskResult::Completed),
                d.failed(at(30)),
                d.cancel_effectively(at(30)),
                d.completed(at(30), TaskResult::Completed).cancel_effectively(at(31)),
                d.cancel_effectively(at(30)).failed(at(31)),
                d.failed(at(30)).completed(at(31), TaskResult::Partial),
            ];
            for candidate in candidates {
                assert!(
                    terminal_timestamps(&candidate) <= 1,
                    "{from:?} produced {candidate:?}"
                );
            }
        }
    }

    #[test]
    fn view_serializes_status_token_and_type() {
        let d = in_status(Status::InProgress);
        let json = serde_json::to_value(d.view()).unwrap();

        assert_eq!(json["status"], "inProgress");
        assert_eq!(json["type"], "completed-task");
        assert!(json.get("completedAt").is_none());
        assert!(json.get("startedAt").is_some());
    }
}
