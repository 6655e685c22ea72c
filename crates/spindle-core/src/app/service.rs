//! TaskService - Store と WorkerPool のオーケストレーション
//!
//! - 作成: validate → Store::create → WorkerPool::enqueue（処理は非同期）
//! - 参照/削除: id の構文チェック → Store
//! - 停止: WorkerPool::shutdown(deadline)

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::status::StatusCounts;
use super::worker_pool::WorkerPool;
use crate::domain::{CreateTaskRequest, Result, SpindleError, Task, TaskId};
use crate::ports::{Clock, TaskStore};

/// Operations the transport layer needs.
///
/// `TaskService` is the implementation used by the server; handler tests
/// plug in their own.
#[async_trait]
pub trait TaskManager: Send + Sync {
    /// Create a `Pending` task and queue it. Returns before processing.
    ///
    /// `cancel` stands for the caller giving up; it only matters when the
    /// queue is full.
    async fn create_task(
        &self,
        request: CreateTaskRequest,
        cancel: &CancellationToken,
    ) -> Result<Task>;

    async fn list_tasks(&self) -> Result<Vec<Task>>;

    /// `id` must be a signed decimal, otherwise `InvalidId`.
    async fn get_task(&self, id: &str) -> Result<Task>;

    /// `id` must be a signed decimal, otherwise `InvalidId`.
    async fn delete_task(&self, id: &str) -> Result<()>;

    async fn counts(&self) -> Result<StatusCounts>;

    /// Stop accepting work and wait up to `deadline` for the workers.
    async fn shutdown(&self, deadline: Duration) -> Result<()>;
}

pub struct TaskService {
    store: Arc<dyn TaskStore>,
    pool: WorkerPool,
    clock: Arc<dyn Clock>,
}

impl TaskService {
    pub(crate) fn new(store: Arc<dyn TaskStore>, pool: WorkerPool, clock: Arc<dyn Clock>) -> Self {
        Self { store, pool, clock }
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }
}

#[async_trait]
impl TaskManager for TaskService {
    async fn create_task(
        &self,
        request: CreateTaskRequest,
        cancel: &CancellationToken,
    ) -> Result<Task> {
        request.validate()?;
        if !self.pool.is_accepting() {
            return Err(SpindleError::ShuttingDown);
        }

        let task = Task::new(request.title, request.description, self.clock.now());
        let task = self.store.create(task).await?;
        info!(task_id = %task.id(), status = %task.status(), "task created");

        if let Err(e) = self.pool.enqueue(task.id(), cancel).await {
            warn!(task_id = %task.id(), error = %e, "task could not be queued, removing it");
            match self.store.delete(task.id()).await {
                Ok(()) => {}
                Err(cleanup) if cleanup.is_not_found() => {}
                Err(cleanup) => {
                    error!(task_id = %task.id(), error = %cleanup, "failed to remove unqueued task");
                }
            }
            return Err(e);
        }

        Ok(task)
    }

    async fn list_tasks(&self) -> Result<Vec<Task>> {
        self.store.list().await
    }

    async fn get_task(&self, id: &str) -> Result<Task> {
        let id = lookup_id(id)?;
        let task = self.store.get(id).await?;
        info!(task_id = %task.id(), status = %task.status(), "task retrieved");
        Ok(task)
    }

    async fn delete_task(&self, id: &str) -> Result<()> {
        let id = lookup_id(id)?;
        self.store.delete(id).await?;
        info!(task_id = %id, "task deleted");
        Ok(())
    }

    async fn counts(&self) -> Result<StatusCounts> {
        let tasks = self.store.list().await?;
        Ok(StatusCounts {
            queued: self.pool.queued(),
            active_workers: self.pool.active_workers(),
            ..StatusCounts::from_tasks(&tasks)
        })
    }

    async fn shutdown(&self, deadline: Duration) -> Result<()> {
        info!("shutting down task service");
        self.pool.shutdown(deadline).await
    }
}

/// 負の id は形式としては正しいが、どのタスクも指さない
fn lookup_id(raw: &str) -> Result<TaskId> {
    TaskId::parse_lookup(raw)?.ok_or(SpindleError::NotFound(TaskId::UNASSIGNED))
}
