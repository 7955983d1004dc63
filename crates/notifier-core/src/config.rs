//! NotifierConfig - パイプラインの設定値

use std::time::Duration;

use crate::impls::DEFAULT_QUEUE_KEY;

pub const DEFAULT_MANAGER_ADDRESS: &str = "manager@example.com";
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_DEQUEUE_TIMEOUT: Duration = Duration::from_secs(1);

/// Process-wide settings.
///
/// `scan_interval` and `dequeue_timeout` are fixed in production (the binary
/// does not expose them); tests shorten them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifierConfig {
    /// Inbox for submission notices and overdue alerts.
    pub manager_address: String,
    /// Redis list key.
    pub queue_key: String,
    pub scan_interval: Duration,
    pub dequeue_timeout: Duration,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            manager_address: DEFAULT_MANAGER_ADDRESS.to_string(),
            queue_key: DEFAULT_QUEUE_KEY.to_string(),
            scan_interval: DEFAULT_SCAN_INTERVAL,
            dequeue_timeout: DEFAULT_DEQUEUE_TIMEOUT,
        }
    }
}

impl NotifierConfig {
    pub fn with_manager_address(mut self, address: impl Into<String>) -> Self {
        self.manager_address = address.into();
        self
    }

    pub fn with_queue_key(mut self, key: impl Into<String>) -> Self {
        self.queue_key = key.into();
        self
    }

    pub fn with_scan_interval(mut self, interval: Duration) -> Self {
        self.scan_interval = interval;
        self
    }

    pub fn with_dequeue_timeout(mut self, timeout: Duration) -> Self {
        self.dequeue_timeout = timeout;
        self
    }
}
