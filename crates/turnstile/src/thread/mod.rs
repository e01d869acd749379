//! Task records, task bodies and the live-task registry

mod registry;
mod task;

pub use registry::{TaskRecord, ThreadRegistry};
pub(crate) use task::TaskBody;
pub use task::{TaskArgs, TaskState, Word, MAX_TASK_ARGS};
