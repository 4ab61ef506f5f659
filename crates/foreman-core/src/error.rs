use std::time::Duration;

use thiserror::Error;

use crate::domain::TaskId;

#[derive(Debug, Error)]
pub enum ForemanError {
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("timed out after {timeout:?} waiting for {task_id}")]
    ReachedTimeout { task_id: TaskId, timeout: Duration },

    #[error("work queue is closed")]
    QueueClosed,

    #[error("unknown status: {0}")]
    UnknownStatus(String),

    #[error("invalid task id: {0}")]
    InvalidTaskId(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to read configuration: {0}")]
    ConfigRead(#[from] std::io::Error),
}
