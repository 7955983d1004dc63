//! EventQueue port - 配送キュー（Redis または InMemory）
//!
//! The queue carries serialized events only. Encoding and decoding live in
//! `domain::event`, so every backend stores the same JSON strings.

use std::time::Duration;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("queue store unavailable: {0}")]
    Unavailable(String),

    #[error("queue operation failed: {0}")]
    OperationFailed(String),
}

/// Durable FIFO between request handlers (many producers) and the worker
/// (one consumer).
///
/// # 設計原則
/// - push は末尾に追加、pop は先頭から取り出す（FIFO）
/// - blocking pop（timeout 付き）。timeout は `Ok(None)` でありエラーではない
/// - consumer は 1 つを前提とし、複数 consumer 間の排他は提供しない
#[async_trait]
pub trait EventQueue: Send + Sync {
    async fn push(&self, payload: String) -> Result<(), QueueError>;

    async fn pop(&self, timeout: Duration) -> Result<Option<String>, QueueError>;

    /// Current depth.
    async fn len(&self) -> Result<usize, QueueError>;
}
