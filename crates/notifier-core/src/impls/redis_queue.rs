//! RedisEventQueue - 本番用の配送キュー
//!
//! LPUSH で末尾に積み、BRPOP で反対側から取り出すので FIFO になります。
//! The list key is shared with any other producer that pushes the same JSON.
//!
//! BRPOP は接続を塞ぐので、pop 専用の接続を別に持つ。
//! That connection has no client-side response timeout: BRPOP answers within
//! its own timeout, and a client that gives up first leaves the server free to
//! hand the next pushed element to a request nobody is waiting for.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, RedisError};
use tracing::{debug, info};

use crate::config::NotifierConfig;
use crate::ports::{EventQueue, QueueError};

pub const DEFAULT_QUEUE_KEY: &str = "notifications";

#[derive(Clone)]
pub struct RedisEventQueue {
    conn: ConnectionManager,
    blocking: ConnectionManager,
    key: String,
}

impl fmt::Debug for RedisEventQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisEventQueue")
            .field("connection", &"ConnectionManager")
            .field("blocking", &"ConnectionManager")
            .field("key", &self.key)
            .finish()
    }
}

fn map_redis_error(op: &str, e: RedisError) -> QueueError {
    if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() {
        QueueError::Unavailable(format!("{op}: {e}"))
    } else {
        QueueError::OperationFailed(format!("{op}: {e}"))
    }
}

impl RedisEventQueue {
    pub async fn connect(redis_url: &str, key: impl Into<String>) -> Result<Self, QueueError> {
        let key = key.into();
        info!(%key, "connecting to Redis queue");

        let client = redis::Client::open(redis_url)
            .map_err(|e| QueueError::Unavailable(format!("invalid Redis URL: {e}")))?;
        let conn = ConnectionManager::new(client.clone())
            .await
            .map_err(|e| map_redis_error("connect", e))?;
        let blocking = ConnectionManager::new_with_config(
            client,
            ConnectionManagerConfig::new().set_response_timeout(None),
        )
        .await
        .map_err(|e| map_redis_error("connect", e))?;

        Ok(Self {
            conn,
            blocking,
            key,
        })
    }

    /// Connects to the list named by `config.queue_key`.
    pub async fn from_config(redis_url: &str, config: &NotifierConfig) -> Result<Self, QueueError> {
        Self::connect(redis_url, config.queue_key.clone()).await
    }
}

#[async_trait]
impl EventQueue for RedisEventQueue {
    async fn push(&self, payload: String) -> Result<(), QueueError> {
        // ConnectionManager は clone しても同じ多重化接続を共有する
        let mut conn = self.conn.clone();
        conn.lpush::<_, _, ()>(&self.key, payload)
            .await
            .map_err(|e| map_redis_error("LPUSH", e))?;
        debug!(key = %self.key, "event pushed");
        Ok(())
    }

    async fn pop(&self, timeout: Duration) -> Result<Option<String>, QueueError> {
        let mut conn = self.blocking.clone();
        let popped: Option<(String, String)> = redis::cmd("BRPOP")
            .arg(&self.key)
            .arg(timeout.as_secs_f64())
            .query_async(&mut conn)
            .await
            .map_err(|e| map_redis_error("BRPOP", e))?;

        Ok(popped.map(|(_key, payload)| payload))
    }

    async fn len(&self) -> Result<usize, QueueError> {
        let mut conn = self.conn.clone();
        conn.llen(&self.key)
            .await
            .map_err(|e| map_redis_error("LLEN", e))
    }
}
