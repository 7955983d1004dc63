//! OverdueScanner - 未提出の週次ログを検出して reminder / escalation を積む
//!
//! # フロー（1 sweep）
//! 1. active な course offering を全件取得
//! 2. 各 offering について現在の ISO 週の activity tracker を探す
//! 3. なければ FacilitatorReminder を積む
//! 4. さらに WeekWindow::escalation() が Some なら OverdueEscalation も積む
//!
//! Nothing is remembered between sweeps, so an offering without a log is
//! flagged again on every sweep until the log is filed.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::notifier::Notifier;
use crate::domain::{NotificationEvent, NotifyError, WeekWindow};
use crate::ports::{Clock, Directory};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub week_number: u32,
    pub offerings_checked: usize,
    pub reminders: usize,
    pub escalations: usize,
    pub enqueue_failures: usize,
}

pub struct OverdueScanner {
    directory: Arc<dyn Directory>,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for OverdueScanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverdueScanner").finish_non_exhaustive()
    }
}

impl OverdueScanner {
    pub fn new(directory: Arc<dyn Directory>, notifier: Notifier, clock: Arc<dyn Clock>) -> Self {
        Self {
            directory,
            notifier,
            clock,
        }
    }

    /// One sweep for the week containing the clock's current time.
    pub async fn sweep(&self) -> Result<SweepReport, NotifyError> {
        let window = WeekWindow::containing(self.clock.now());
        self.sweep_window(&window).await
    }

    /// Any lookup error abandons the whole sweep. Events already queued by
    /// this sweep stay queued.
    pub async fn sweep_window(&self, window: &WeekWindow) -> Result<SweepReport, NotifyError> {
        let offerings = self.directory.find_active_course_offerings().await?;
        let mut report = SweepReport {
            week_number: window.week_number,
            ..SweepReport::default()
        };

        for offering in &offerings {
            report.offerings_checked += 1;

            let filed = self
                .directory
                .find_activity_tracker_for(offering.id, window.week_number)
                .await?;
            if filed.is_some() {
                continue;
            }
            debug!(
                course_offering_id = %offering.id,
                week = window.week_number,
                "activity log missing"
            );

            let reminder = NotificationEvent::facilitator_reminder(
                offering.facilitator_id,
                offering.id,
                window.week_number,
                window.deadline,
            );
            if self.emit(&reminder).await {
                report.reminders += 1;
            } else {
                report.enqueue_failures += 1;
            }

            if let Some(days_overdue) = window.escalation() {
                let escalation = NotificationEvent::overdue_escalation(
                    offering.facilitator_id,
                    offering.id,
                    window.week_number,
                    days_overdue,
                );
                if self.emit(&escalation).await {
                    report.escalations += 1;
                } else {
                    report.enqueue_failures += 1;
                }
            }
        }

        info!(
            week = report.week_number,
            checked = report.offerings_checked,
            reminders = report.reminders,
            escalations = report.escalations,
            enqueue_failures = report.enqueue_failures,
            "overdue sweep finished"
        );
        Ok(report)
    }

    // Notifier は失敗をログ済みなので、ここでは成否だけ返す
    async fn emit(&self, event: &NotificationEvent) -> bool {
        self.notifier.enqueue(event).await.is_ok()
    }
}
