//! Dispatcher - イベント 1 件をメール 1 通に変換
//!
//! # フロー
//! 1. kind で分岐（Unknown は何もしない）
//! 2. Directory から facilitator と course offering を引く（どちらか欠ければ skip）
//! 3. テンプレートを描画して宛先を決める
//! 4. Mailer::send を 1 回だけ呼ぶ（失敗しても再送しない）

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::templates;
use crate::domain::{
    CourseOffering, CourseOfferingId, Facilitator, FacilitatorId, NotificationEvent, NotifyError,
};
use crate::ports::{Clock, DeliveryReceipt, Directory, MailError, Mailer, OutboundEmail};

/// How one dispatch ended. Only lookup failures are errors; everything here
/// counts as "consumed".
#[derive(Debug)]
pub enum DispatchOutcome {
    Sent(DeliveryReceipt),
    /// Facilitator or offering was deleted after the event was queued.
    MissingReferent,
    UnknownKind,
    /// The single send attempt failed. Not retried.
    DeliveryFailed(MailError),
}

pub struct Dispatcher {
    directory: Arc<dyn Directory>,
    mailer: Arc<dyn Mailer>,
    clock: Arc<dyn Clock>,
    manager_address: String,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("manager_address", &self.manager_address)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(
        directory: Arc<dyn Directory>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
        manager_address: impl Into<String>,
    ) -> Self {
        Self {
            directory,
            mailer,
            clock,
            manager_address: manager_address.into(),
        }
    }

    pub async fn dispatch(&self, event: &NotificationEvent) -> Result<DispatchOutcome, NotifyError> {
        let email = match event {
            NotificationEvent::ActivityLogSubmitted(e) => {
                let Some((facilitator, offering)) =
                    self.resolve(e.facilitator_id, e.course_offering_id).await?
                else {
                    return Ok(self.skip_missing(event));
                };
                templates::submission_notice(
                    &facilitator,
                    &offering,
                    e.week_number,
                    self.clock.now(),
                )
                .to(&self.manager_address)
            }
            NotificationEvent::FacilitatorReminder(e) => {
                let Some((facilitator, offering)) =
                    self.resolve(e.facilitator_id, e.course_offering_id).await?
                else {
                    return Ok(self.skip_missing(event));
                };
                templates::due_soon_reminder(&facilitator, &offering, e.week_number, e.deadline)
                    .to(&facilitator.email)
            }
            NotificationEvent::OverdueEscalation(e) => {
                let Some((facilitator, offering)) =
                    self.resolve(e.facilitator_id, e.course_offering_id).await?
                else {
                    return Ok(self.skip_missing(event));
                };
                templates::overdue_alert(&facilitator, &offering, e.week_number, e.days_overdue)
                    .to(&self.manager_address)
            }
            NotificationEvent::Unknown => {
                warn!("unknown notification kind, skipping");
                return Ok(DispatchOutcome::UnknownKind);
            }
        };

        Ok(self.deliver(event, email).await)
    }

    async fn resolve(
        &self,
        facilitator: FacilitatorId,
        offering: CourseOfferingId,
    ) -> Result<Option<(Facilitator, CourseOffering)>, NotifyError> {
        let Some(facilitator) = self.directory.find_facilitator(facilitator).await? else {
            return Ok(None);
        };
        let offering = self
            .directory
            .find_course_offering_with_module_and_class(offering)
            .await?;
        Ok(offering.map(|o| (facilitator, o)))
    }

    fn skip_missing(&self, event: &NotificationEvent) -> DispatchOutcome {
        if let Some((facilitator, offering, week)) = event.subject() {
            debug!(
                kind = %event.kind(),
                facilitator_id = %facilitator,
                course_offering_id = %offering,
                week,
                "referent no longer exists, skipping"
            );
        }
        DispatchOutcome::MissingReferent
    }

    async fn deliver(&self, event: &NotificationEvent, email: OutboundEmail) -> DispatchOutcome {
        let kind = event.kind();
        match self.mailer.send(&email).await {
            Ok(receipt) => {
                info!(%kind, to = %email.to, message_id = ?receipt.message_id, "notification sent");
                DispatchOutcome::Sent(receipt)
            }
            Err(e) => {
                warn!(%kind, to = %email.to, error = %e, "notification delivery failed, not retrying");
                DispatchOutcome::DeliveryFailed(e)
            }
        }
    }
}
