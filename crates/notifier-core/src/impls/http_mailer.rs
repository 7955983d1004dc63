//! HttpMailer - HTTP API 経由のトランザクションメール送信
//!
//! POSTs `{ from, to, subject, html }` as JSON with a bearer key. Most hosted
//! providers accept this shape; the response body's `id` (if any) becomes the
//! receipt's message id.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ports::{DeliveryReceipt, MailError, Mailer, OutboundEmail};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

#[derive(Deserialize, Default)]
struct SendResponse {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Clone)]
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    from: String,
}

impl fmt::Debug for HttpMailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpMailer")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("from", &self.from)
            .finish()
    }
}

impl HttpMailer {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        from: impl Into<String>,
    ) -> Result<Self, MailError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| MailError::Transport(format!("client setup: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            from: from.into(),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<DeliveryReceipt, MailError> {
        let body = SendRequest {
            from: &self.from,
            to: &email.to,
            subject: &email.subject,
            html: &email.html,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        // 2xx なら本文が読めなくても送信は受理されている
        let parsed: SendResponse = response.json().await.unwrap_or_default();
        debug!(to = %email.to, message_id = ?parsed.id, "mail accepted by provider");

        Ok(DeliveryReceipt {
            to: email.to.clone(),
            message_id: parsed.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_hides_api_key() {
        let mailer =
            HttpMailer::new("https://mail.example.com/send", "sk-secret", "noreply@example.com")
                .unwrap();
        let printed = format!("{mailer:?}");
        assert!(!printed.contains("sk-secret"));
        assert!(printed.contains("mail.example.com"));
    }

    #[test]
    fn request_body_shape() {
        let body = SendRequest {
            from: "noreply@example.com",
            to: "manager@example.com",
            subject: "s",
            html: "<p>h</p>",
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["to"], "manager@example.com");
        assert_eq!(value["from"], "noreply@example.com");
        assert_eq!(value["html"], "<p>h</p>");
    }
}
