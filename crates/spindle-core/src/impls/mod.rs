//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryTaskStore**: プロセス内の正本（本番用）
//!
//! テスト用の TaskStore（blocking / failing）は `testing` にある。

pub mod inmem_store;

#[cfg(test)]
pub(crate) mod testing;

pub use self::inmem_store::InMemoryTaskStore;
