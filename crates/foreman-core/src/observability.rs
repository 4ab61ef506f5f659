use serde::{Deserialize, Serialize};

use crate::domain::Status;

/// Number of known tasks per status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub waiting: usize,
    pub in_progress: usize,
    pub cancel_requested: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub failed: usize,
}

impl StatusCounts {
    pub fn record(&mut self, status: Status) {
        let slot = match status {
            Status::Waiting => &mut self.waiting,
            Status::InProgress => &mut self.in_progress,
            Status::CancelRequested => &mut self.cancel_requested,
            Status::Completed => &mut self.completed,
            Status::Cancelled => &mut self.cancelled,
            Status::Failed => &mut self.failed,
        };
        *slot += 1;
    }

    pub fn get(&self, status: Status) -> usize {
        match status {
            Status::Waiting => self.waiting,
            Status::InProgress => self.in_progress,
            Status::CancelRequested => self.cancel_requested,
            Status::Completed => self.completed,
            Status::Cancelled => self.cancelled,
            Status::Failed => self.failed,
        }
    }

    pub fn total(&self) -> usize {
        Status::ALL.into_iter().map(|status| self.get(status)).sum()
    }

    /// Tasks that have not reached a terminal status yet.
    pub fn pending(&self) -> usize {
        self.waiting + self.in_progress + self.cancel_requested
    }
}

impl FromIterator<Status> for StatusCounts {
    fn from_iter<I: IntoIterator<Item = Status>>(iter: I) -> Self {
        let mut counts = Self::default();
        for status in iter {
            counts.record(status);
        }
        counts
    }
}
