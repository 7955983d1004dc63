//! WorkerLoop - dispatch ループと scan ループ
//!
//! # フロー
//! - dispatch: EventQueue::pop(timeout) → decode → Dispatcher::dispatch → stats
//! - scan: scan_interval ごとに OverdueScanner::sweep
//!
//! The two tasks share nothing except the shutdown channel and the stats, so a
//! slow sweep never holds up dispatch and vice versa.
//!
//! A pop is never raced against shutdown. Dropping a pending pop could lose an
//! event that was already removed from the store, so the loop only looks at the
//! shutdown flag between pops; `dequeue_timeout` bounds how long that takes.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::dispatcher::Dispatcher;
use super::scanner::OverdueScanner;
use super::status::{WorkerCounts, WorkerStats};
use crate::config::NotifierConfig;
use crate::domain::NotificationEvent;
use crate::ports::EventQueue;

pub struct WorkerLoop {
    queue: Arc<dyn EventQueue>,
    dispatcher: Arc<Dispatcher>,
    scanner: Arc<OverdueScanner>,
    dequeue_timeout: Duration,
    scan_interval: Duration,
}

impl WorkerLoop {
    pub fn new(
        queue: Arc<dyn EventQueue>,
        dispatcher: Arc<Dispatcher>,
        scanner: Arc<OverdueScanner>,
        config: &NotifierConfig,
    ) -> Self {
        Self {
            queue,
            dispatcher,
            scanner,
            dequeue_timeout: config.dequeue_timeout,
            scan_interval: config.scan_interval,
        }
    }

    /// Start both loops on the current runtime.
    pub fn spawn(self) -> WorkerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let stats = Arc::new(WorkerStats::default());

        let dispatch = tokio::spawn(dispatch_loop(
            self.queue,
            self.dispatcher,
            Arc::clone(&stats),
            self.dequeue_timeout,
            shutdown_rx.clone(),
        ));
        let scan = tokio::spawn(scan_loop(
            self.scanner,
            Arc::clone(&stats),
            self.scan_interval,
            shutdown_rx,
        ));
        info!(
            scan_interval_secs = self.scan_interval.as_secs_f64(),
            "notification worker started"
        );

        WorkerHandle {
            shutdown_tx,
            joins: vec![dispatch, scan],
            stats,
        }
    }
}

/// Handle to a running worker.
/// - `request_shutdown()` は新しい pop を止めるだけ（処理中の 1 件は最後まで走る）
/// - `shutdown_and_join()` で両ループの終了を待つ
pub struct WorkerHandle {
    shutdown_tx: watch::Sender<bool>,
    joins: Vec<JoinHandle<()>>,
    stats: Arc<WorkerStats>,
}

impl WorkerHandle {
    pub fn request_shutdown(&self) {
        // receivers may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn shutdown_and_join(self) -> WorkerCounts {
        self.request_shutdown();
        for join in self.joins {
            if let Err(e) = join.await {
                error!(error = %e, "worker task panicked");
            }
        }
        info!("notification worker stopped");
        self.stats.snapshot()
    }

    pub fn stats(&self) -> WorkerCounts {
        self.stats.snapshot()
    }
}

fn stopping(rx: &watch::Receiver<bool>) -> bool {
    *rx.borrow() || rx.has_changed().is_err()
}

async fn dispatch_loop(
    queue: Arc<dyn EventQueue>,
    dispatcher: Arc<Dispatcher>,
    stats: Arc<WorkerStats>,
    timeout: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        if stopping(&shutdown_rx) {
            break;
        }

        let raw = match queue.pop(timeout).await {
            Ok(Some(raw)) => raw,
            Ok(None) => continue,
            Err(e) => {
                stats.record_queue_error();
                error!(error = %e, "dequeue failed");
                // sleep だけは shutdown と競合させてよい
                tokio::select! {
                    _ = shutdown_rx.changed() => {}
                    _ = tokio::time::sleep(timeout) => {}
                }
                continue;
            }
        };

        let event = match NotificationEvent::decode(&raw) {
            Ok(event) => event,
            Err(e) => {
                stats.record_decode_failure();
                warn!(error = %e, payload = %raw, "dropping undecodable notification");
                continue;
            }
        };

        match dispatcher.dispatch(&event).await {
            Ok(outcome) => {
                debug!(kind = %event.kind(), ?outcome, "notification consumed");
                stats.record_outcome(&outcome);
            }
            Err(e) => {
                stats.record_dispatch_error();
                error!(kind = %event.kind(), error = %e, error_kind = ?e.kind(), "dispatch failed, dropping notification");
            }
        }
    }
    debug!("dispatch loop exited");
}

async fn scan_loop(
    scanner: Arc<OverdueScanner>,
    stats: Arc<WorkerStats>,
    period: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    // 初回は起動直後ではなく 1 period 後
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if stopping(&shutdown_rx) {
            break;
        }
        tokio::select! {
            _ = shutdown_rx.changed() => continue,
            _ = ticker.tick() => {}
        }

        match scanner.sweep().await {
            Ok(_) => stats.record_sweep(true),
            Err(e) => {
                stats.record_sweep(false);
                error!(error = %e, "overdue sweep failed");
            }
        }
    }
    debug!("scan loop exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::notifier::Notifier;
    use crate::domain::{CourseOfferingId, FacilitatorId, OfferingStatus};
    use crate::impls::{InMemoryEventQueue, MemoryDirectory, MemoryMailer};
    use crate::ports::FixedClock;
    use chrono::{TimeZone, Utc};
    use std::collections::HashSet;

    const MANAGER: &str = "manager@example.com";

    struct Harness {
        queue: Arc<InMemoryEventQueue>,
        directory: Arc<MemoryDirectory>,
        mailer: Arc<MemoryMailer>,
        notifier: Notifier,
        worker: WorkerLoop,
    }

    fn harness(scan_interval: Duration) -> Harness {
        let queue = Arc::new(InMemoryEventQueue::new());
        let directory = Arc::new(MemoryDirectory::new());
        let mailer = Arc::new(MemoryMailer::new());
        // Wednesday of ISO week 6
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 2, 5, 9, 0, 0).unwrap(),
        ));
        let notifier = Notifier::new(queue.clone());
        let config = NotifierConfig::default()
            .with_manager_address(MANAGER)
            .with_dequeue_timeout(Duration::from_millis(50))
            .with_scan_interval(scan_interval);

        let dispatcher = Arc::new(Dispatcher::new(
            directory.clone(),
            mailer.clone(),
            clock.clone(),
            config.manager_address.clone(),
        ));
        let scanner = Arc::new(OverdueScanner::new(
            directory.clone(),
            notifier.clone(),
            clock,
        ));
        let worker = WorkerLoop::new(queue.clone(), dispatcher, scanner, &config);

        Harness {
            queue,
            directory,
            mailer,
            notifier,
            worker,
        }
    }

    async fn wait_until(mut done: impl FnMut() -> bool, limit: Duration) -> bool {
        let deadline = Instant::now() + limit;
        while Instant::now() < deadline {
            if done() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        done()
    }

    #[tokio::test]
    async fn submission_flows_from_enqueue_to_manager_inbox() {
        let h = harness(Duration::from_secs(3600));
        let f = h.directory.add_facilitator("Noor Haddad", "noor@example.com");
        let o = h
            .directory
            .add_offering(f.id, "Operating Systems", "2025-J", OfferingStatus::Active);
        let handle = h.worker.spawn();

        h.notifier.activity_log_submitted(f.id, o.id, 5).await.unwrap();

        let mailer = h.mailer.clone();
        assert!(wait_until(|| mailer.sent().len() == 1, Duration::from_secs(5)).await);
        let mail = &h.mailer.sent()[0];
        assert_eq!(mail.to, MANAGER);
        assert!(mail.html.contains("Noor Haddad"));
        assert!(mail.html.contains("<strong>Week:</strong> 5</li>"));

        let counts = handle.shutdown_and_join().await;
        assert_eq!(counts.dispatched, 1);
        assert_eq!(counts.sent, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_producers_lose_and_duplicate_nothing() {
        const PRODUCERS: u32 = 10;
        const PER_PRODUCER: u32 = 100;
        const TOTAL: usize = (PRODUCERS * PER_PRODUCER) as usize;

        let h = harness(Duration::from_secs(3600));
        let f = h.directory.add_facilitator("Sam Okafor", "sam@example.com");
        let o = h
            .directory
            .add_offering(f.id, "Compilers", "2025-S", OfferingStatus::Active);
        let handle = h.worker.spawn();

        let mut producers = Vec::new();
        for p in 0..PRODUCERS {
            let notifier = h.notifier.clone();
            producers.push(tokio::spawn(async move {
                for i in 0..PER_PRODUCER {
                    let week = p * PER_PRODUCER + i + 1;
                    notifier.activity_log_submitted(f.id, o.id, week).await.unwrap();
                }
            }));
        }
        for p in producers {
            p.await.unwrap();
        }

        let mailer = h.mailer.clone();
        assert!(wait_until(|| mailer.sent().len() >= TOTAL, Duration::from_secs(30)).await);
        let counts = handle.shutdown_and_join().await;

        let sent = h.mailer.sent();
        assert_eq!(sent.len(), TOTAL);
        assert_eq!(counts.dispatched, TOTAL as u64);
        assert_eq!(counts.sent, TOTAL as u64);

        let weeks: HashSet<u32> = sent
            .iter()
            .map(|m| {
                let start = m.html.find("<strong>Week:</strong> ").unwrap()
                    + "<strong>Week:</strong> ".len();
                let rest = &m.html[start..];
                rest[..rest.find('<').unwrap()].parse().unwrap()
            })
            .collect();
        assert_eq!(weeks.len(), TOTAL);
        assert!(weeks.iter().all(|w| (1..=TOTAL as u32).contains(w)));
        assert_eq!(h.queue.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn undecodable_payload_is_dropped_and_counted() {
        let h = harness(Duration::from_secs(3600));
        let f = h.directory.add_facilitator("Noor Haddad", "noor@example.com");
        let o = h
            .directory
            .add_offering(f.id, "Operating Systems", "2025-J", OfferingStatus::Active);
        let handle = h.worker.spawn();

        h.queue.push("{not json".to_string()).await.unwrap();
        h.notifier.activity_log_submitted(f.id, o.id, 2).await.unwrap();

        let mailer = h.mailer.clone();
        assert!(wait_until(|| mailer.sent().len() == 1, Duration::from_secs(5)).await);
        let counts = handle.shutdown_and_join().await;
        assert_eq!(counts.decode_failed, 1);
        assert_eq!(counts.sent, 1);
    }

    #[tokio::test]
    async fn unknown_kind_and_missing_referent_are_consumed() {
        let h = harness(Duration::from_secs(3600));
        let handle = h.worker.spawn();

        h.queue
            .push(r#"{"type":"weekly_digest","facilitatorId":"x"}"#.to_string())
            .await
            .unwrap();
        h.notifier
            .activity_log_submitted(FacilitatorId::random(), CourseOfferingId::random(), 3)
            .await
            .unwrap();

        assert!(wait_until(|| handle.stats().dispatched == 2, Duration::from_secs(5)).await);
        let counts = handle.shutdown_and_join().await;
        assert_eq!(counts.unknown_kind, 1);
        assert_eq!(counts.skipped_missing, 1);
        assert_eq!(h.mailer.attempts(), 0);
    }

    #[tokio::test]
    async fn delivery_failure_does_not_stop_the_loop() {
        let h = harness(Duration::from_secs(3600));
        let f = h.directory.add_facilitator("Noor Haddad", "noor@example.com");
        let o = h
            .directory
            .add_offering(f.id, "Operating Systems", "2025-J", OfferingStatus::Active);
        let handle = h.worker.spawn();

        h.mailer.set_failing(true);
        h.notifier.activity_log_submitted(f.id, o.id, 1).await.unwrap();
        assert!(wait_until(|| handle.stats().delivery_failed == 1, Duration::from_secs(5)).await);

        h.mailer.set_failing(false);
        h.notifier.activity_log_submitted(f.id, o.id, 2).await.unwrap();
        let mailer = h.mailer.clone();
        assert!(wait_until(|| mailer.sent().len() == 1, Duration::from_secs(5)).await);

        let counts = handle.shutdown_and_join().await;
        // 失敗した 1 件は再送されない
        assert_eq!(h.mailer.attempts(), 2);
        assert_eq!(counts.delivery_failed, 1);
        assert_eq!(counts.sent, 1);
    }

    #[tokio::test]
    async fn shutdown_joins_while_idle() {
        let h = harness(Duration::from_secs(3600));
        let handle = h.worker.spawn();

        let joined =
            tokio::time::timeout(Duration::from_secs(5), handle.shutdown_and_join()).await;

        let counts = joined.unwrap();
        assert_eq!(counts, WorkerCounts::default());
    }

    #[tokio::test]
    async fn periodic_scan_reminds_the_facilitator() {
        let h = harness(Duration::from_millis(100));
        let f = h.directory.add_facilitator("Rin Takahashi", "rin@example.com");
        h.directory
            .add_offering(f.id, "Distributed Systems", "2025-J", OfferingStatus::Active);
        let handle = h.worker.spawn();

        let mailer = h.mailer.clone();
        assert!(wait_until(|| !mailer.sent().is_empty(), Duration::from_secs(5)).await);
        let counts = handle.shutdown_and_join().await;

        let reminder = &h.mailer.sent()[0];
        assert_eq!(reminder.to, "rin@example.com");
        assert!(reminder.html.contains("<strong>Week:</strong> 6</li>"));
        assert!(counts.sweeps >= 1);
        // 水曜なので escalation は出ない
        assert!(h.mailer.sent().iter().all(|m| m.to != MANAGER));
    }
}
