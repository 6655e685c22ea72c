//! WorkerPool - bounded queue + fixed set of workers
//!
//! # フロー（1 worker, 1 iteration）
//! 1. queue から task_id を取得（空なら待つ）
//! 2. TaskStore から取得 → Processing へ遷移 → `update`
//! 3. processing_delay だけ待つ（shutdown で中断可能）
//! 4. Completed へ遷移 → `update`（ここは中断しない）
//!
//! Stop is cooperative. The signal is checked before dequeuing, while
//! waiting on the queue, right after a dequeue, and during the step 3
//! delay. A task whose id was dequeued after the stop stays `Pending`; a
//! worker interrupted in step 3 exits and leaves its task in `Processing`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, mpsc, watch};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

use crate::domain::{Result, SpindleError, TaskId};
use crate::ports::{Clock, TaskStore};

/// Result text written on every successfully processed task.
pub const COMPLETED_RESULT: &str = "Task completed successfully";

/// Worker pool configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerPoolConfig {
    /// Number of concurrent workers (at least 1)
    pub worker_count: usize,

    /// Capacity of the bounded queue (at least 1)
    pub queue_capacity: usize,

    /// Simulated processing time per task
    pub processing_delay: Duration,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            worker_count: 5,
            queue_capacity: 100,
            processing_delay: Duration::from_secs(120),
        }
    }
}

impl WorkerPoolConfig {
    /// Set the number of workers. Values below 1 are clamped up.
    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count.max(1);
        self
    }

    /// Set the queue capacity. Values below 1 are clamped up.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    pub fn with_processing_delay(mut self, delay: Duration) -> Self {
        self.processing_delay = delay;
        self
    }

    fn normalized(self) -> Self {
        Self {
            worker_count: self.worker_count.max(1),
            queue_capacity: self.queue_capacity.max(1),
            ..self
        }
    }
}

/// Worker pool handle.
/// - `enqueue()` で task_id を queue に積む
/// - `shutdown()` で停止を通知し、deadline まで終了を待つ
/// - handle を drop しても全ワーカーが止まる
pub struct WorkerPool {
    config: WorkerPoolConfig,
    sender: mpsc::Sender<TaskId>,
    shutdown_tx: watch::Sender<bool>,
    tracker: TaskTracker,
}

impl WorkerPool {
    /// Spawn `config.worker_count` workers on the current Tokio runtime.
    pub fn spawn(
        config: WorkerPoolConfig,
        store: Arc<dyn TaskStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let config = config.normalized();
        let (sender, receiver) = mpsc::channel(config.queue_capacity);
        let receiver = Arc::new(Mutex::new(receiver));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let tracker = TaskTracker::new();
        for worker_id in 0..config.worker_count {
            let worker = Worker {
                id: worker_id,
                store: Arc::clone(&store),
                clock: Arc::clone(&clock),
                queue: Arc::clone(&receiver),
                processing_delay: config.processing_delay,
                shutdown_rx: shutdown_rx.clone(),
            };
            tracker.spawn(worker.run());
        }
        tracker.close();

        Self {
            config,
            sender,
            shutdown_tx,
            tracker,
        }
    }

    pub fn config(&self) -> &WorkerPoolConfig {
        &self.config
    }

    /// `false` once shutdown has been requested.
    pub fn is_accepting(&self) -> bool {
        !*self.shutdown_tx.borrow()
    }

    /// Workers that have not exited yet.
    pub fn active_workers(&self) -> usize {
        self.tracker.len()
    }

    /// Ids sitting in the queue, not yet picked up.
    pub fn queued(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    /// Hand a task to the workers.
    ///
    /// Tries a non-blocking send first. When the queue is full and `cancel`
    /// has already fired, the call fails with `QueueFull`; otherwise it
    /// falls back to a blocking send that waits, without any bound, until a
    /// worker frees a slot.
    pub async fn enqueue(&self, task_id: TaskId, cancel: &CancellationToken) -> Result<()> {
        if !self.is_accepting() {
            return Err(SpindleError::ShuttingDown);
        }

        match self.sender.try_send(task_id) {
            Ok(()) => {
                info!(task_id = %task_id, "task queued for processing");
                Ok(())
            }
            Err(TrySendError::Full(task_id)) => {
                if cancel.is_cancelled() {
                    return Err(SpindleError::QueueFull(task_id));
                }
                warn!(
                    task_id = %task_id,
                    "task queue is full, task will be processed when space is available"
                );
                self.sender
                    .send(task_id)
                    .await
                    .map_err(|_| SpindleError::ShuttingDown)
            }
            Err(TrySendError::Closed(_)) => Err(SpindleError::ShuttingDown),
        }
    }

    /// Request shutdown for all workers without waiting.
    pub fn request_shutdown(&self) {
        // receivers may already be gone; send_replace still records the flag
        self.shutdown_tx.send_replace(true);
    }

    /// Stop taking new work and wait for every worker to exit, bounded by
    /// `deadline`.
    ///
    /// On timeout the workers are not aborted; they keep running in the
    /// background and only the wait is abandoned.
    pub async fn shutdown(&self, deadline: Duration) -> Result<()> {
        info!(
            workers = self.active_workers(),
            deadline_ms = deadline.as_millis() as u64,
            "shutting down worker pool"
        );
        self.request_shutdown();

        match tokio::time::timeout(deadline, self.tracker.wait()).await {
            Ok(()) => {
                info!("all workers stopped");
                Ok(())
            }
            Err(_) => {
                warn!(
                    still_running = self.active_workers(),
                    "worker pool did not stop before the deadline"
                );
                Err(SpindleError::ShutdownTimeout(deadline))
            }
        }
    }
}

struct Worker {
    id: usize,
    store: Arc<dyn TaskStore>,
    clock: Arc<dyn Clock>,
    queue: Arc<Mutex<mpsc::Receiver<TaskId>>>,
    processing_delay: Duration,
    shutdown_rx: watch::Receiver<bool>,
}

impl Worker {
    async fn run(mut self) {
        info!(worker_id = self.id, "worker started");

        loop {
            // shutdown が来ていたら抜ける
            if *self.shutdown_rx.borrow() {
                break;
            }

            // dequeue は待つ可能性があるので shutdown と競合させる
            let next = tokio::select! {
                biased;
                _ = stop_requested(&mut self.shutdown_rx) => break,
                next = next_task(&self.queue) => next,
            };

            let Some(task_id) = next else {
                // sender が drop された（pool handle ごと破棄）
                break;
            };

            if !self.process(task_id).await {
                return;
            }
        }

        info!(worker_id = self.id, "worker stopping due to shutdown signal");
    }

    /// Run steps 2-4 for one task. Returns `false` when the worker must exit.
    async fn process(&mut self, task_id: TaskId) -> bool {
        // dequeue と停止要求が競合した場合は step 2 に入らない
        if *self.shutdown_rx.borrow() {
            info!(worker_id = self.id, task_id = %task_id, "task left pending due to shutdown");
            return false;
        }

        let mut task = match self.store.get(task_id).await {
            Ok(task) => task,
            Err(e) => {
                warn!(worker_id = self.id, task_id = %task_id, error = %e, "task disappeared before processing");
                return true;
            }
        };

        if let Err(e) = task.start(self.clock.now()) {
            error!(worker_id = self.id, task_id = %task_id, error = %e, "task cannot enter processing");
            return true;
        }
        let mut task = match self.store.update(task).await {
            Ok(task) => task,
            Err(e) => {
                // 失敗したタスクは retry しない（Processing のまま放置される可能性あり）
                error!(worker_id = self.id, task_id = %task_id, error = %e, "failed to update task status");
                return true;
            }
        };

        info!(
            worker_id = self.id,
            task_id = %task_id,
            started_at = ?task.started_at(),
            duration = task.duration_text().unwrap_or_default(),
            "task processing started"
        );

        tokio::select! {
            biased;
            _ = stop_requested(&mut self.shutdown_rx) => {
                info!(worker_id = self.id, task_id = %task_id, "task processing cancelled due to shutdown");
                return false;
            }
            _ = tokio::time::sleep(self.processing_delay) => {}
        }

        // ここから先は中断しない
        if let Err(e) = task.complete(COMPLETED_RESULT, self.clock.now()) {
            error!(worker_id = self.id, task_id = %task_id, error = %e, "task cannot complete");
            return true;
        }
        match self.store.update(task).await {
            Ok(task) => {
                info!(
                    worker_id = self.id,
                    task_id = %task_id,
                    result = task.result().unwrap_or_default(),
                    duration = task.duration_text().unwrap_or_default(),
                    "task completed"
                );
            }
            Err(e) => {
                error!(worker_id = self.id, task_id = %task_id, error = %e, "failed to update task status");
            }
        }
        true
    }
}

/// Resolves once shutdown is requested (or the pool handle is dropped).
async fn stop_requested(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}

async fn next_task(queue: &Mutex<mpsc::Receiver<TaskId>>) -> Option<TaskId> {
    queue.lock().await.recv().await
}
