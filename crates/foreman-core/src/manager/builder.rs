//! TaskManagerBuilder - TaskManager の構築とワイヤリング
//!
//! 設定は build() 時に検証されます（Fail-fast）。

use std::sync::Arc;

use super::TaskManager;
use crate::config::TaskManagerConfig;
use crate::error::ForemanError;
use crate::ports::{Clock, IdGenerator, SystemClock, UlidGenerator};
use crate::worker::{self, TaskManagerWorker};

/// Builds a [`TaskManager`] with injected collaborators.
///
/// # 使用例
/// ```ignore
/// let manager = TaskManager::builder()
///     .with_config(TaskManagerConfig::pooled(4))
///     .with_clock(FixedClock::new(instant))
///     .build()?;
/// ```
///
/// - clock を差し替えると、id 生成器のデフォルトも同じ clock を使う
/// - `with_worker` で渡した worker は config の `worker` より優先される
#[derive(Default)]
pub struct TaskManagerBuilder {
    config: TaskManagerConfig,
    clock: Option<Arc<dyn Clock>>,
    id_generator: Option<Arc<dyn IdGenerator>>,
    worker: Option<Arc<dyn TaskManagerWorker>>,
}

impl TaskManagerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: TaskManagerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    pub fn with_id_generator(mut self, id_generator: impl IdGenerator + 'static) -> Self {
        self.id_generator = Some(Arc::new(id_generator));
        self
    }

    pub fn with_worker(mut self, worker: Arc<dyn TaskManagerWorker>) -> Self {
        self.worker = Some(worker);
        self
    }

    /// Validates the configuration and starts the work queue. Must be called
    /// within a Tokio runtime.
    pub fn build(self) -> Result<TaskManager, ForemanError> {
        self.config.validate()?;

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);
        let id_generator = self
            .id_generator
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(Arc::clone(&clock))) as Arc<dyn IdGenerator>);
        let worker = self.worker.unwrap_or_else(|| {
            worker::from_strategy(&self.config.worker, self.config.partial_as_failure)
        });

        Ok(TaskManager::assemble(
            clock,
            id_generator,
            worker,
            self.config.queue_capacity,
        ))
    }
}
