//! NotifierBuilder - 起動時のワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）: 欠けている port は build() でまとめて報告

use std::fmt;
use std::sync::Arc;

use super::dispatcher::Dispatcher;
use super::notifier::Notifier;
use super::scanner::OverdueScanner;
use super::worker_loop::{WorkerHandle, WorkerLoop};
use crate::config::NotifierConfig;
use crate::domain::NotifyError;
use crate::ports::{Clock, Directory, EventQueue, Mailer, SystemClock};

/// # 使用例
/// ```ignore
/// let service = NotifierBuilder::new()
///     .config(NotifierConfig::default().with_manager_address("ops@example.com"))
///     .queue(Arc::new(RedisEventQueue::connect(url, "notifications").await?))
///     .directory(Arc::new(PgDirectory::new(pool)))
///     .mailer(Arc::new(LogMailer))
///     .build()?;
/// let worker = service.spawn_worker();
/// ```
#[derive(Default)]
pub struct NotifierBuilder {
    config: NotifierConfig,
    queue: Option<Arc<dyn EventQueue>>,
    directory: Option<Arc<dyn Directory>>,
    mailer: Option<Arc<dyn Mailer>>,
    clock: Option<Arc<dyn Clock>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("missing components: {0:?}")]
    MissingComponents(Vec<&'static str>),

    #[error("manager address must not be empty")]
    EmptyManagerAddress,

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}

impl NotifierBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: NotifierConfig) -> Self {
        self.config = config;
        self
    }

    pub fn queue(mut self, queue: Arc<dyn EventQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn directory(mut self, directory: Arc<dyn Directory>) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    /// 省略時は SystemClock
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<NotificationService, BuildError> {
        let mut missing = Vec::new();
        if self.queue.is_none() {
            missing.push("queue");
        }
        if self.directory.is_none() {
            missing.push("directory");
        }
        if self.mailer.is_none() {
            missing.push("mailer");
        }
        let (Some(queue), Some(directory), Some(mailer)) = (self.queue, self.directory, self.mailer)
        else {
            return Err(BuildError::MissingComponents(missing));
        };

        if self.config.manager_address.trim().is_empty() {
            return Err(BuildError::EmptyManagerAddress);
        }
        if self.config.scan_interval.is_zero() {
            return Err(BuildError::ZeroDuration("scan_interval"));
        }
        if self.config.dequeue_timeout.is_zero() {
            return Err(BuildError::ZeroDuration("dequeue_timeout"));
        }

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);
        let notifier = Notifier::new(Arc::clone(&queue));
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&directory),
            mailer,
            Arc::clone(&clock),
            self.config.manager_address.clone(),
        ));
        let scanner = Arc::new(OverdueScanner::new(directory, notifier.clone(), clock));

        Ok(NotificationService {
            config: self.config,
            queue,
            notifier,
            dispatcher,
            scanner,
        })
    }
}

/// Wired pipeline. Hand [`NotificationService::notifier`] to producers and
/// call [`NotificationService::spawn_worker`] once.
pub struct NotificationService {
    config: NotifierConfig,
    queue: Arc<dyn EventQueue>,
    notifier: Notifier,
    dispatcher: Arc<Dispatcher>,
    scanner: Arc<OverdueScanner>,
}

impl fmt::Debug for NotificationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl NotificationService {
    pub fn notifier(&self) -> Notifier {
        self.notifier.clone()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn scanner(&self) -> &OverdueScanner {
        &self.scanner
    }

    pub fn config(&self) -> &NotifierConfig {
        &self.config
    }

    pub fn spawn_worker(&self) -> WorkerHandle {
        WorkerLoop::new(
            Arc::clone(&self.queue),
            Arc::clone(&self.dispatcher),
            Arc::clone(&self.scanner),
            &self.config,
        )
        .spawn()
    }

    pub async fn queue_depth(&self) -> Result<usize, NotifyError> {
        Ok(self.queue.len().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OfferingStatus;
    use crate::impls::{InMemoryEventQueue, MemoryDirectory, MemoryMailer};
    use rstest::rstest;
    use std::time::Duration;

    fn complete() -> NotifierBuilder {
        NotifierBuilder::new()
            .queue(Arc::new(InMemoryEventQueue::new()))
            .directory(Arc::new(MemoryDirectory::new()))
            .mailer(Arc::new(MemoryMailer::new()))
    }

    #[test]
    fn test_build_success() {
        let service = complete().build().unwrap();
        assert_eq!(service.config(), &NotifierConfig::default());
    }

    #[test]
    fn test_build_reports_every_missing_component() {
        let err = NotifierBuilder::new()
            .mailer(Arc::new(MemoryMailer::new()))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::MissingComponents(missing) if missing == vec!["queue", "directory"]
        ));
    }

    #[rstest]
    #[case::blank_manager(NotifierConfig::default().with_manager_address("  "), "manager")]
    #[case::zero_scan(NotifierConfig::default().with_scan_interval(Duration::ZERO), "scan_interval")]
    #[case::zero_timeout(NotifierConfig::default().with_dequeue_timeout(Duration::ZERO), "dequeue_timeout")]
    fn test_build_rejects_bad_config(#[case] config: NotifierConfig, #[case] needle: &str) {
        let err = complete().config(config).build().unwrap_err();
        assert!(err.to_string().contains(needle), "{err}");
    }

    #[tokio::test]
    async fn test_service_round_trip() {
        let directory = Arc::new(MemoryDirectory::new());
        let mailer = Arc::new(MemoryMailer::new());
        let f = directory.add_facilitator("Ada Quinn", "ada@example.com");
        let o = directory.add_offering(f.id, "Security", "2025-J", OfferingStatus::Active);
        let service = NotifierBuilder::new()
            .config(NotifierConfig::default().with_dequeue_timeout(Duration::from_millis(50)))
            .queue(Arc::new(InMemoryEventQueue::new()))
            .directory(directory)
            .mailer(mailer.clone())
            .build()
            .unwrap();

        service.notifier().activity_log_submitted(f.id, o.id, 4).await.unwrap();
        assert_eq!(service.queue_depth().await.unwrap(), 1);

        let worker = service.spawn_worker();
        for _ in 0..200 {
            if !mailer.sent().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let counts = worker.shutdown_and_join().await;

        assert_eq!(counts.sent, 1);
        assert_eq!(service.queue_depth().await.unwrap(), 0);
        assert_eq!(mailer.sent()[0].to, "manager@example.com");
    }
}
