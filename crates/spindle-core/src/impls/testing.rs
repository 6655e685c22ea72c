//! Test doubles for [`TaskStore`].

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Notify, Semaphore};

use super::InMemoryTaskStore;
use crate::domain::{Result, SpindleError, Task, TaskId, TaskStatus};
use crate::ports::TaskStore;

/// Holds every `Processing` update until the test releases it.
///
/// `started` fires once per held update, so a test can wait until a worker
/// is parked inside step 2.
pub(crate) struct BlockingStore {
    inner: InMemoryTaskStore,
    gate: Semaphore,
    pub(crate) started: Notify,
}

impl BlockingStore {
    pub(crate) fn new() -> Self {
        Self {
            inner: InMemoryTaskStore::new(),
            gate: Semaphore::new(0),
            started: Notify::new(),
        }
    }

    pub(crate) fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }
}

#[async_trait]
impl TaskStore for BlockingStore {
    async fn create(&self, task: Task) -> Result<Task> {
        self.inner.create(task).await
    }

    async fn list(&self) -> Result<Vec<Task>> {
        self.inner.list().await
    }

    async fn get(&self, id: TaskId) -> Result<Task> {
        self.inner.get(id).await
    }

    async fn update(&self, task: Task) -> Result<Task> {
        if task.status() == TaskStatus::Processing {
            self.started.notify_one();
            self.gate
                .acquire()
                .await
                .map_err(|e| SpindleError::Internal(e.to_string()))?
                .forget();
        }
        self.inner.update(task).await
    }

    async fn delete(&self, id: TaskId) -> Result<()> {
        self.inner.delete(id).await
    }
}

/// Rejects every update, counting the attempts.
pub(crate) struct FailingStore {
    inner: InMemoryTaskStore,
    pub(crate) update_attempts: AtomicUsize,
}

impl FailingStore {
    pub(crate) fn new() -> Self {
        Self {
            inner: InMemoryTaskStore::new(),
            update_attempts: AtomicUsize::new(0),
        }
    }

    pub(crate) fn attempts(&self) -> usize {
        self.update_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskStore for FailingStore {
    async fn create(&self, task: Task) -> Result<Task> {
        self.inner.create(task).await
    }

    async fn list(&self) -> Result<Vec<Task>> {
        self.inner.list().await
    }

    async fn get(&self, id: TaskId) -> Result<Task> {
        self.inner.get(id).await
    }

    async fn update(&self, _task: Task) -> Result<Task> {
        self.update_attempts.fetch_add(1, Ordering::SeqCst);
        Err(SpindleError::Internal("store unavailable".to_string()))
    }

    async fn delete(&self, id: TaskId) -> Result<()> {
        self.inner.delete(id).await
    }
}
