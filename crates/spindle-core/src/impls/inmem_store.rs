//! InMemoryTaskStore - プロセス内の TaskStore
//!
//! # 実装詳細
//! - `HashMap<TaskId, Task>` 全体を 1 つの RwLock で保護
//! - 読み取り同士は並行、書き込みは排他
//! - 削除したエントリは完全に消える（tombstone なし）

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{Result, SpindleError, Task, TaskId};
use crate::ports::{IdGenerator, SequentialIdGenerator, TaskStore};

pub struct InMemoryTaskStore {
    tasks: RwLock<HashMap<TaskId, Task>>,
    ids: Box<dyn IdGenerator>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::with_id_generator(SequentialIdGenerator::new())
    }

    pub fn with_id_generator(ids: impl IdGenerator + 'static) -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            ids: Box::new(ids),
        }
    }

    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn create(&self, mut task: Task) -> Result<Task> {
        let mut tasks = self.tasks.write().await;
        // id は lock の内側で払い出す（挿入順と id 順を揃える）
        task.assign_id(self.ids.next_id())?;
        tasks.insert(task.id(), task.clone());
        Ok(task)
    }

    async fn list(&self) -> Result<Vec<Task>> {
        let tasks = self.tasks.read().await;
        Ok(tasks.values().cloned().collect())
    }

    async fn get(&self, id: TaskId) -> Result<Task> {
        let tasks = self.tasks.read().await;
        tasks.get(&id).cloned().ok_or(SpindleError::NotFound(id))
    }

    async fn update(&self, task: Task) -> Result<Task> {
        let mut tasks = self.tasks.write().await;
        let Some(slot) = tasks.get_mut(&task.id()) else {
            return Err(SpindleError::NotFound(task.id()));
        };
        *slot = task.clone();
        Ok(task)
    }

    async fn delete(&self, id: TaskId) -> Result<()> {
        let mut tasks = self.tasks.write().await;
        tasks
            .remove(&id)
            .map(|_| ())
            .ok_or(SpindleError::NotFound(id))
    }
}
