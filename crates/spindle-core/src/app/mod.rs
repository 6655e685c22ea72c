//! App - アプリケーション層
//!
//! ports を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **WorkerPool**: bounded queue + 固定数の worker
//! - **TaskService**: Store と Pool のオーケストレーション
//! - **ServiceBuilder**: ワイヤリングと起動時検証
//! - **StatusCounts**: status ごとの件数

pub mod builder;
pub mod service;
pub mod status;
pub mod worker_pool;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, ServiceBuilder};
pub use self::service::{TaskManager, TaskService};
pub use self::status::StatusCounts;
pub use self::worker_pool::{COMPLETED_RESULT, WorkerPool, WorkerPoolConfig};
