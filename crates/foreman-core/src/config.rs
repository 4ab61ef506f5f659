//! Engine configuration.
//!
//! ```toml
//! partial_as_failure = false
//! queue_capacity = 128
//!
//! [worker]
//! kind = "pooled"
//! size = 4
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ForemanError;

/// How dispatched tasks are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkerStrategy {
    /// One task at a time, in submission order.
    #[default]
    Serial,
    /// Up to `size` tasks at a time.
    Pooled { size: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TaskManagerConfig {
    pub worker: WorkerStrategy,

    /// `None` keeps the queue unbounded; `Some(n)` makes `submit` wait while
    /// `n` tasks are queued.
    pub queue_capacity: Option<usize>,

    /// Report `Partial` results as failures instead of partial completions.
    pub partial_as_failure: bool,
}

impl TaskManagerConfig {
    pub fn pooled(size: usize) -> Self {
        Self {
            worker: WorkerStrategy::Pooled { size },
            ..Self::default()
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ForemanError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ForemanError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ForemanError> {
        if let WorkerStrategy::Pooled { size: 0 } = self.worker {
            return Err(ForemanError::InvalidConfig(
                "pooled worker size must be greater than 0".to_string(),
            ));
        }
        if self.queue_capacity == Some(0) {
            return Err(ForemanError::InvalidConfig(
                "queue_capacity must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
