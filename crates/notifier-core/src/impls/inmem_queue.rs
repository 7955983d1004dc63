//! InMemoryEventQueue - 開発・テスト用の配送キュー
//!
//! # 実装詳細
//! - Mutex<VecDeque<String>> で FIFO を保持
//! - Condvar で push 時に待機中の pop を起こす
//! - async context から同期ロックを扱うため spawn_blocking を使う

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::ports::{EventQueue, QueueError};

/// In-process queue. Not durable across restarts; use `RedisEventQueue` in
/// production.
///
/// # 使用例
/// ```ignore
/// let queue = InMemoryEventQueue::new();
/// queue.push(payload).await?;
/// let next = queue.pop(Duration::from_secs(1)).await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryEventQueue {
    items: Arc<Mutex<VecDeque<String>>>,
    /// push 時の通知用
    condvar: Arc<Condvar>,
}

impl InMemoryEventQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> QueueError {
    QueueError::OperationFailed("queue lock poisoned".to_string())
}

#[async_trait]
impl EventQueue for InMemoryEventQueue {
    async fn push(&self, payload: String) -> Result<(), QueueError> {
        let items = Arc::clone(&self.items);
        let condvar = Arc::clone(&self.condvar);

        tokio::task::spawn_blocking(move || -> Result<(), QueueError> {
            let mut items = items.lock().map_err(poisoned)?;
            items.push_back(payload);
            condvar.notify_one();
            Ok(())
        })
        .await
        .map_err(|e| QueueError::OperationFailed(format!("push failed: {e}")))?
    }

    async fn pop(&self, timeout: Duration) -> Result<Option<String>, QueueError> {
        let items = Arc::clone(&self.items);
        let condvar = Arc::clone(&self.condvar);

        tokio::task::spawn_blocking(move || -> Result<Option<String>, QueueError> {
            let start = Instant::now();
            let mut guard = items.lock().map_err(poisoned)?;
            loop {
                if let Some(payload) = guard.pop_front() {
                    return Ok(Some(payload));
                }
                let remaining = timeout.saturating_sub(start.elapsed());
                if remaining.is_zero() {
                    return Ok(None);
                }
                // spurious wakeup もあるので、起きたら必ず先頭を見直す
                let (next, _) = condvar.wait_timeout(guard, remaining).map_err(poisoned)?;
                guard = next;
            }
        })
        .await
        .map_err(|e| QueueError::OperationFailed(format!("pop failed: {e}")))?
    }

    async fn len(&self) -> Result<usize, QueueError> {
        let items = self.items.lock().map_err(poisoned)?;
        Ok(items.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tokio::time::Instant;

    #[tokio::test]
    async fn pop_returns_items_in_push_order() {
        let queue = InMemoryEventQueue::new();
        for i in 0..50 {
            queue.push(format!("event-{i}")).await.unwrap();
        }

        for i in 0..50 {
            let popped = queue.pop(Duration::from_millis(100)).await.unwrap();
            assert_eq!(popped, Some(format!("event-{i}")));
        }
        assert_eq!(queue.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn pop_times_out_with_none() {
        let queue = InMemoryEventQueue::new();
        let start = Instant::now();

        let popped = queue.pop(Duration::from_millis(300)).await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(300));
        assert_eq!(popped, None);
    }

    #[tokio::test]
    async fn push_wakes_waiting_pop() {
        let queue = Arc::new(InMemoryEventQueue::new());

        let waiter = tokio::spawn({
            let queue = Arc::clone(&queue);
            async move { queue.pop(Duration::from_secs(5)).await.unwrap() }
        });

        tokio::time::sleep(Duration::from_millis(200)).await;
        queue.push("late".to_string()).await.unwrap();

        assert_eq!(waiter.await.unwrap(), Some("late".to_string()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_producers_lose_nothing() {
        let queue = Arc::new(InMemoryEventQueue::new());

        let producers: Vec<_> = (0..10)
            .map(|p| {
                let queue = Arc::clone(&queue);
                tokio::spawn(async move {
                    for i in 0..100 {
                        queue.push(format!("{p}-{i}")).await.unwrap();
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.await.unwrap();
        }

        let mut seen = HashSet::new();
        let mut last_index_per_producer = [None::<u32>; 10];
        while let Some(payload) = queue.pop(Duration::from_millis(50)).await.unwrap() {
            let (p, i) = payload.split_once('-').unwrap();
            let (p, i): (usize, u32) = (p.parse().unwrap(), i.parse().unwrap());
            // 同一 producer 内の順序は保たれる
            if let Some(prev) = last_index_per_producer[p] {
                assert!(i > prev);
            }
            last_index_per_producer[p] = Some(i);
            assert!(seen.insert(payload));
        }
        assert_eq!(seen.len(), 1000);
    }
}
