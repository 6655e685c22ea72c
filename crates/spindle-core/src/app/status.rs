//! Status - status ごとの件数

use serde::{Deserialize, Serialize};

use crate::domain::{Task, TaskStatus};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    pub total: usize,

    /// Ids waiting in the queue.
    pub queued: usize,

    /// Workers still running.
    pub active_workers: usize,
}

impl StatusCounts {
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut counts = StatusCounts::default();
        for task in tasks {
            match task.status() {
                TaskStatus::Pending => counts.pending += 1,
                TaskStatus::Processing => counts.processing += 1,
                TaskStatus::Completed => counts.completed += 1,
                TaskStatus::Failed => counts.failed += 1,
            }
            counts.total += 1;
        }
        counts
    }
}
