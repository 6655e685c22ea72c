//! Ports - 抽象化レイヤー
//!
//! 各 trait は差し替え可能な境界を表します。
//! 本番実装は `impls`、テスト用の実装は各モジュールの tests にあります。

pub mod task_store;
pub mod clock;
pub mod id_generator;

// 主要な trait を再エクスポート
pub use self::task_store::TaskStore;
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, SequentialIdGenerator};
