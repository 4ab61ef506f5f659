//! Task lifecycle status.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ForemanError;

/// Status of a submitted task.
///
/// Transitions (see [`TaskExecutionDetails`](super::TaskExecutionDetails)):
/// - Waiting -> InProgress -> Completed | Failed
/// - Waiting | InProgress -> CancelRequested -> Cancelled
/// - Waiting -> Cancelled (dropped before dispatch)
///
/// Serialized with the tokens external reporting layers expect
/// (`waiting`, `inProgress`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "waiting")]
    Waiting,

    #[serde(rename = "inProgress")]
    InProgress,

    #[serde(rename = "canceledRequested")]
    CancelRequested,

    #[serde(rename = "completed")]
    Completed,

    #[serde(rename = "canceled")]
    Cancelled,

    #[serde(rename = "failed")]
    Failed,
}

impl Status {
    pub const ALL: [Status; 6] = [
        Status::Waiting,
        Status::InProgress,
        Status::CancelRequested,
        Status::Completed,
        Status::Cancelled,
        Status::Failed,
    ];

    /// No transition leaves a terminal status.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Status::Completed | Status::Cancelled | Status::Failed
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Waiting => "waiting",
            Status::InProgress => "inProgress",
            Status::CancelRequested => "canceledRequested",
            Status::Completed => "completed",
            Status::Cancelled => "canceled",
            Status::Failed => "failed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ForemanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ForemanError::UnknownStatus(s.to_string()))
    }
}
