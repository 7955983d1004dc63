//! LogMailer - メールを送らずログに書き出す（開発用）

use async_trait::async_trait;
use tracing::info;

use crate::ports::{DeliveryReceipt, MailError, Mailer, OutboundEmail};

#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<DeliveryReceipt, MailError> {
        info!(
            to = %email.to,
            subject = %email.subject,
            bytes = email.html.len(),
            "mail not delivered (log mailer)"
        );
        Ok(DeliveryReceipt {
            to: email.to.clone(),
            message_id: None,
        })
    }
}
