//! Slack webhook notification target

use super::format::AlertMessage;
use super::notifier::NotificationTarget;
use super::types::{
    CrNotificationParams, Notification, TroveClosureNotificationParams, TroveCrNotificationParams,
};
use crate::error::NotifyError;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

/// Prefix of the fallback text shown in Slack notifications
pub const TEXT_PREFIX: &str = "Liquity Alert";

/// Slack target settings, supplied at startup
#[derive(Debug, Clone, PartialEq)]
pub struct SlackConfig {
    /// Incoming webhook URL
    pub webhook_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl SlackConfig {
    /// Settings for `webhook_url` with a 10 second timeout
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Posts alerts to a Slack incoming webhook
pub struct SlackTarget {
    client: reqwest::Client,
    config: SlackConfig,
}

impl SlackTarget {
    /// Create a target from explicit settings
    pub fn new(config: SlackConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Build the webhook payload: fallback text, header block, mrkdwn section
    fn payload(message: &AlertMessage) -> Value {
        let body = message
            .fields
            .iter()
            .map(|field| match &field.link {
                Some(link) => format!("*{}*: <{}|{}>", field.label, link, field.value),
                None => format!("*{}*: {}", field.label, field.value),
            })
            .collect::<Vec<_>>()
            .join("\n");

        json!({
            "text": format!("{}: {}", TEXT_PREFIX, message.title),
            "blocks": [
                {
                    "type": "header",
                    "text": { "type": "plain_text", "text": message.title }
                },
                {
                    "type": "section",
                    "text": { "type": "mrkdwn", "text": body }
                }
            ]
        })
    }

    async fn post(&self, notification: Notification<'_>) -> Result<(), NotifyError> {
        let payload = Self::payload(&AlertMessage::compose(&notification));

        let response = self
            .client
            .post(&self.config.webhook_url)
            .timeout(self.config.timeout)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected(format!("{}: {}", status, body)));
        }

        log::debug!("Posted {} alert to Slack", notification.kind());
        Ok(())
    }
}

#[async_trait]
impl NotificationTarget for SlackTarget {
    fn name(&self) -> &str {
        "slack"
    }

    async fn notify_tcr(&self, params: &CrNotificationParams) -> Result<(), NotifyError> {
        self.post(Notification::Tcr(params)).await
    }

    async fn notify_trove_cr(&self, params: &TroveCrNotificationParams) -> Result<(), NotifyError> {
        self.post(Notification::TroveCr(params)).await
    }

    async fn notify_trove_closure(
        &self,
        params: &TroveClosureNotificationParams,
    ) -> Result<(), NotifyError> {
        self.post(Notification::TroveClosure(params)).await
    }
}
