//! Domain model (IDs, tasks, requests, errors).

pub mod errors;
pub mod ids;
pub mod request;
pub mod task;

pub use self::errors::{Result, SpindleError};
pub use self::ids::TaskId;
pub use self::request::CreateTaskRequest;
pub use self::task::{Task, TaskStatus};
