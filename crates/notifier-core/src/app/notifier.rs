//! Notifier - producer 側のハンドル
//!
//! Constructed once at startup and cloned into every request handler. A
//! handler never waits for delivery; at most it waits for one queue push.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error};

use crate::domain::{CourseOfferingId, FacilitatorId, NotificationEvent, NotifyError};
use crate::ports::EventQueue;

#[derive(Clone)]
pub struct Notifier {
    queue: Arc<dyn EventQueue>,
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier").finish_non_exhaustive()
    }
}

impl Notifier {
    pub fn new(queue: Arc<dyn EventQueue>) -> Self {
        Self { queue }
    }

    /// Serialize `event` and append it to the queue.
    ///
    /// A failure is logged here, so callers that do not care may drop the
    /// result. The event is lost in that case.
    pub async fn enqueue(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        let kind = event.kind();
        match self.push(event).await {
            Ok(()) => {
                debug!(%kind, "notification queued");
                Ok(())
            }
            Err(e) => {
                error!(%kind, error = %e, "failed to queue notification, dropping it");
                Err(e)
            }
        }
    }

    /// Like [`Notifier::enqueue`], but the push runs on its own task so the
    /// caller returns immediately.
    pub fn enqueue_detached(&self, event: NotificationEvent) {
        let notifier = self.clone();
        tokio::spawn(async move {
            // エラーは enqueue 内でログ済み
            let _ = notifier.enqueue(&event).await;
        });
    }

    /// What the activity-tracker create handler calls after a successful insert.
    pub async fn activity_log_submitted(
        &self,
        facilitator: FacilitatorId,
        offering: CourseOfferingId,
        week_number: u32,
    ) -> Result<(), NotifyError> {
        self.enqueue(&NotificationEvent::activity_log_submitted(
            facilitator,
            offering,
            week_number,
        ))
        .await
    }

    async fn push(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        let payload = event.encode()?;
        self.queue.push(payload).await?;
        Ok(())
    }
}
