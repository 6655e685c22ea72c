//! IdGenerator port - ID 生成の抽象化
//!
//! # 実装
//! - **SequentialIdGenerator**: プロセス内の連番（1 から開始、再利用なし）

use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::TaskId;

/// IdGenerator は TaskId を払い出す
///
/// # Thread Safety
/// - `Send + Sync` を要求（複数スレッドから使える）
/// - `next_id` は atomic で、同じ値を二度返さない
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> TaskId;
}

/// Monotonic counter starting at 1.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Start the sequence somewhere other than 1. Values below 1 are
    /// clamped so [`TaskId::UNASSIGNED`] is never handed out.
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first.max(1)),
        }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> TaskId {
        TaskId::new(self.next.fetch_add(1, Ordering::Relaxed))
    }
}
