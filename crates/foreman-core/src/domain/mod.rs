//! Domain model: ids, the task contract, statuses and execution details.

pub mod details;
pub mod ids;
pub mod status;
pub mod task;

pub use details::{DetailsView, TaskExecutionDetails};
pub use ids::TaskId;
pub use status::Status;
pub use task::{Task, TaskError, TaskResult, TaskType, TaskWithId};
