//! ServiceBuilder - TaskService の構築とワイヤリング
//!
//! - Store / Clock は差し替え可能（既定: InMemoryTaskStore / SystemClock）
//! - build() は Tokio runtime 上でのみ成功する（Fail-fast）

use std::sync::Arc;
use std::time::Duration;

use super::service::TaskService;
use super::worker_pool::{WorkerPool, WorkerPoolConfig};
use crate::impls::InMemoryTaskStore;
use crate::ports::{Clock, SystemClock, TaskStore};

/// ServiceBuilder は TaskService を構築
///
/// # 使用例
/// ```ignore
/// let service = ServiceBuilder::new()
///     .worker_count(5)
///     .queue_capacity(100)
///     .processing_delay(Duration::from_secs(120))
///     .build()?;
/// ```
pub struct ServiceBuilder {
    store: Option<Arc<dyn TaskStore>>,
    clock: Option<Arc<dyn Clock>>,
    pool_config: WorkerPoolConfig,
}

/// BuildError は構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("No Tokio runtime available. The worker pool must be built from within a runtime.")]
    NoRuntime,
}

impl ServiceBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            clock: None,
            pool_config: WorkerPoolConfig::default(),
        }
    }

    pub fn store(mut self, store: Arc<dyn TaskStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Replace the whole pool configuration.
    pub fn pool_config(mut self, config: WorkerPoolConfig) -> Self {
        self.pool_config = config;
        self
    }

    pub fn worker_count(mut self, count: usize) -> Self {
        self.pool_config = self.pool_config.with_worker_count(count);
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.pool_config = self.pool_config.with_queue_capacity(capacity);
        self
    }

    pub fn processing_delay(mut self, delay: Duration) -> Self {
        self.pool_config = self.pool_config.with_processing_delay(delay);
        self
    }

    /// Wire the store, clock and worker pool together and start the workers.
    ///
    /// # 検証
    /// - 現在のスレッドに Tokio runtime が無ければ BuildError::NoRuntime
    pub fn build(self) -> Result<TaskService, BuildError> {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(BuildError::NoRuntime);
        }

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryTaskStore::new()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let pool = WorkerPool::spawn(self.pool_config, Arc::clone(&store), Arc::clone(&clock));

        Ok(TaskService::new(store, pool, clock))
    }
}

impl Default for ServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_outside_runtime_fails() {
        let result = ServiceBuilder::new().build();
        assert!(matches!(result, Err(BuildError::NoRuntime)));
    }

    #[tokio::test]
    async fn test_build_with_defaults() {
        let service = ServiceBuilder::new().build().unwrap();
        assert_eq!(service.pool().config(), &WorkerPoolConfig::default());
        assert!(service.pool().is_accepting());
        assert_eq!(service.pool().active_workers(), 5);
    }

    #[tokio::test]
    async fn test_build_clamps_sizes() {
        let service = ServiceBuilder::new()
            .worker_count(0)
            .queue_capacity(0)
            .build()
            .unwrap();
        assert_eq!(service.pool().config().worker_count, 1);
        assert_eq!(service.pool().config().queue_capacity, 1);
    }

    #[tokio::test]
    async fn test_build_with_pool_config() {
        let config = WorkerPoolConfig::default()
            .with_worker_count(2)
            .with_processing_delay(Duration::from_millis(5));
        let service = ServiceBuilder::new()
            .pool_config(config.clone())
            .build()
            .unwrap();
        assert_eq!(service.pool().config(), &config);
    }
}
