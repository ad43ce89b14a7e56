//! Slack webhook delivery.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use tracing::debug;

use crate::message::slack_payload;
use crate::{LeadAlert, Notifier, NotifyError};

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .pool_max_idle_per_host(4)
        .build()
        .expect("Failed to build HTTP client")
});

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Best-effort Slack webhook sink.
pub struct SlackNotifier {
    webhook_url: String,
    timeout: Duration,
}

impl SlackNotifier {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn notify(&self, alert: &LeadAlert) -> Result<(), NotifyError> {
        let payload = slack_payload(alert);

        let response = HTTP_CLIENT
            .post(&self.webhook_url)
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| NotifyError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(lead_id = %alert.lead_id, "slack notification sent");
            return Ok(());
        }

        let mut body = response.text().await.unwrap_or_default();
        body.truncate(200);
        Err(NotifyError::Status {
            status: status.as_u16(),
            body,
        })
    }
}
