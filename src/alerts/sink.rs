//! Notification sinks: where alert payloads get delivered

use crate::types::alert::{AlertChannel, AlertPayload, AlertSeverity};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Why a delivery attempt failed
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DeliveryError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("endpoint answered with status {0}")]
    Status(u16),

    #[error("delivery timed out after {0:?}")]
    Timeout(Duration),

    #[error("channel not configured: {0}")]
    NotConfigured(String),

    #[error("delivery task aborted: {0}")]
    Aborted(String),
}

/// One delivery target. Implementations must not retry.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, payload: &AlertPayload) -> Result<(), DeliveryError>;
}

/// Stands in for a channel that is enabled but lacks what it needs to
/// deliver; every attempt fails with [`DeliveryError::NotConfigured`].
pub struct UnconfiguredSink {
    missing: String,
}

impl UnconfiguredSink {
    pub fn new(missing: &str) -> Self {
        Self {
            missing: missing.to_string(),
        }
    }
}

#[async_trait]
impl NotificationSink for UnconfiguredSink {
    async fn deliver(&self, _payload: &AlertPayload) -> Result<(), DeliveryError> {
        Err(DeliveryError::NotConfigured(self.missing.clone()))
    }
}

/// Slack attachment colour per severity
pub fn slack_color(severity: AlertSeverity) -> &'static str {
    match severity {
        AlertSeverity::Info => "#36a64f",
        AlertSeverity::Warning => "#ff9800",
        AlertSeverity::Error => "#f44336",
        AlertSeverity::Critical => "#9c27b0",
    }
}

/// Teams theme colour per severity
pub fn teams_color(severity: AlertSeverity) -> &'static str {
    match severity {
        AlertSeverity::Info => "0078D4",
        AlertSeverity::Warning => "FF8C00",
        AlertSeverity::Error => "D13438",
        AlertSeverity::Critical => "5C2D91",
    }
}

/// Slack incoming-webhook body
pub fn slack_body(payload: &AlertPayload, slack_channel: &str) -> Value {
    json!({
        "channel": slack_channel,
        "username": "Fraud Detection Bot",
        "icon_emoji": ":shield:",
        "attachments": [{
            "color": slack_color(payload.severity),
            "title": payload.title,
            "text": payload.message,
            "footer": format!("Fraud Detection System | {}", payload.severity.as_str().to_uppercase()),
            "ts": payload.timestamp.timestamp(),
        }],
    })
}

/// Teams MessageCard body
pub fn teams_body(payload: &AlertPayload) -> Value {
    json!({
        "@type": "MessageCard",
        "@context": "https://schema.org/extensions",
        "summary": payload.title,
        "themeColor": teams_color(payload.severity),
        "title": format!("Fraud Detection Alert: {}", payload.title),
        "sections": [{
            "activityTitle": payload.message,
            "activitySubtitle": format!("Severity: {}", payload.severity.as_str().to_uppercase()),
        }],
    })
}

/// Posts alerts as JSON to a webhook URL, formatted for its channel
pub struct HttpSink {
    client: reqwest::Client,
    channel: AlertChannel,
    url: String,
    slack_channel: String,
}

impl HttpSink {
    pub fn new(channel: AlertChannel, url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            channel,
            url: url.to_string(),
            slack_channel: "#fraud-detection-alerts".to_string(),
        }
    }

    /// Slack channel named in Slack bodies
    pub fn with_slack_channel(mut self, slack_channel: &str) -> Self {
        self.slack_channel = slack_channel.to_string();
        self
    }

    /// Request body for this sink's channel
    pub fn body(&self, payload: &AlertPayload) -> Value {
        match self.channel {
            AlertChannel::Slack => slack_body(payload, &self.slack_channel),
            AlertChannel::Teams => teams_body(payload),
            AlertChannel::Email | AlertChannel::Webhook => {
                serde_json::to_value(payload).unwrap_or(Value::Null)
            }
        }
    }
}

#[async_trait]
impl NotificationSink for HttpSink {
    async fn deliver(&self, payload: &AlertPayload) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(&self.url)
            .json(&self.body(payload))
            .send()
            .await
            .map_err(|e| DeliveryError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Status(status.as_u16()));
        }

        debug!(channel = %self.channel, status = status.as_u16(), "Alert posted");
        Ok(())
    }
}
