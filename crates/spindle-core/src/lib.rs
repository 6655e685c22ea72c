//! spindle-core
//!
//! Task lifecycle and worker-pool scheduling for the Spindle service.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, task, request, errors）
//! - **ports**: 抽象化レイヤー（TaskStore, Clock, IdGenerator）
//! - **impls**: ports の実装（InMemoryTaskStore）
//! - **app**: アプリケーションロジック（worker_pool, service, builder, status）

pub mod domain;
pub mod ports;
pub mod impls;
pub mod app;

pub use domain::{CreateTaskRequest, Result, SpindleError, Task, TaskId, TaskStatus};
pub use app::{ServiceBuilder, StatusCounts, TaskManager, TaskService, WorkerPool, WorkerPoolConfig};
