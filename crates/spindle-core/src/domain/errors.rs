//! Errors - エラー型と分類
//!
//! Store, pool and service all report through [`SpindleError`]; the HTTP
//! adapter maps each variant onto a status code.

use std::time::Duration;

use thiserror::Error;

use super::ids::TaskId;
use super::task::TaskStatus;

#[derive(Debug, Error)]
pub enum SpindleError {
    /// The task does not exist (never created, or already deleted).
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The caller supplied an identifier that is not a task id.
    #[error("invalid task ID format: {0:?}")]
    InvalidId(String),

    /// The creation request is missing a required field.
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("invalid state transition: {from} -> {to}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },

    /// The queue was full and the caller gave up before space freed up.
    #[error("task queue is full, enqueue of task {0} cancelled")]
    QueueFull(TaskId),

    /// Shutdown has begun; no new work is accepted.
    #[error("task service is shutting down")]
    ShuttingDown,

    /// Workers were still busy when the caller's deadline elapsed.
    #[error("graceful shutdown did not finish within {0:?}")]
    ShutdownTimeout(Duration),

    #[error("{0}")]
    Internal(String),
}

impl SpindleError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SpindleError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, SpindleError>;
