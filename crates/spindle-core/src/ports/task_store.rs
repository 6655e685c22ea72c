//! TaskStore port - Task の正本（source of truth）
//!
//! 設計原則:
//! - ID の払い出しは store だけが行う
//! - 5 つの操作は互いに atomic
//! - `list` は snapshot を返す（内部の map は外に出さない）

use async_trait::async_trait;

use crate::domain::{Result, Task, TaskId};

/// Keyed, concurrency-safe task storage.
///
/// `InMemoryTaskStore` is the production implementation; tests swap in
/// doubles that block or fail on purpose.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Assign the next id, insert, and return the stored task.
    async fn create(&self, task: Task) -> Result<Task>;

    /// Snapshot of every current task, in no particular order.
    async fn list(&self) -> Result<Vec<Task>>;

    async fn get(&self, id: TaskId) -> Result<Task>;

    /// Replace the stored value for `task.id()`. Fails with `NotFound` if the
    /// id is absent; tasks cannot be updated into existence.
    async fn update(&self, task: Task) -> Result<Task>;

    async fn delete(&self, id: TaskId) -> Result<()>;
}
