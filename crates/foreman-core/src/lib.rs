//! foreman-core
//!
//! Asynchronous task execution engine: accepts units of work, runs them
//! under controlled concurrency, tracks their lifecycle and supports
//! cancellation.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（TaskId, Task, Status, TaskExecutionDetails）
//! - **ports**: 抽象化レイヤー（Clock, IdGenerator, Listener）
//! - **worker**: タスクの実行（SerialWorker, PooledWorker）
//! - **queue**: submit と実行を切り離す FIFO の WorkQueue
//! - **manager**: TaskManager（facade）と TaskManagerBuilder
//! - **tasks**: 参照用のタスク実装
//! - **config**: TOML から読む TaskManagerConfig
//! - **observability**: StatusCounts

pub mod config;
pub mod domain;
pub mod error;
pub mod manager;
pub mod observability;
pub mod ports;
pub mod queue;
pub mod tasks;
pub mod worker;

pub use config::{TaskManagerConfig, WorkerStrategy};
pub use domain::{
    DetailsView, Status, Task, TaskError, TaskExecutionDetails, TaskId, TaskResult, TaskType,
    TaskWithId,
};
pub use error::ForemanError;
pub use manager::{TaskManager, TaskManagerBuilder};
pub use observability::StatusCounts;
pub use worker::TaskManagerWorker;

pub use tokio_util::sync::CancellationToken;
