//! Alert fan-out across notification channels

use super::rules::AlertPolicy;
use super::sink::{DeliveryError, HttpSink, NotificationSink, UnconfiguredSink};
use crate::config::AppConfig;
use crate::types::alert::{AlertChannel, AlertPayload, AlertSeverity};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Result of one delivery attempt on one channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Delivered,
    Failed { reason: String },
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered)
    }
}

/// Per-channel outcomes of a dispatch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DispatchReport {
    pub outcomes: BTreeMap<AlertChannel, DeliveryOutcome>,
}

impl DispatchReport {
    /// Channels that accepted the alert
    pub fn succeeded(&self) -> Vec<AlertChannel> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_delivered())
            .map(|(channel, _)| *channel)
            .collect()
    }

    /// Channel name to success flag
    pub fn as_bool_map(&self) -> BTreeMap<String, bool> {
        self.outcomes
            .iter()
            .map(|(channel, outcome)| (channel.to_string(), outcome.is_delivered()))
            .collect()
    }

    /// True when every attempted channel delivered (vacuously true when none were attempted)
    pub fn all_delivered(&self) -> bool {
        self.outcomes.values().all(DeliveryOutcome::is_delivered)
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

struct ChannelEntry {
    enabled: bool,
    sink: Arc<dyn NotificationSink>,
}

/// Fans alerts out to registered sinks, one independent timeout per channel
pub struct AlertManager {
    channels: BTreeMap<AlertChannel, ChannelEntry>,
    timeout: Duration,
    policy: AlertPolicy,
}

impl AlertManager {
    pub fn new(timeout: Duration, policy: AlertPolicy) -> Self {
        Self {
            channels: BTreeMap::new(),
            timeout,
            policy,
        }
    }

    /// Manager with HTTP sinks for every active channel in the alerts section.
    ///
    /// A channel enabled without the settings it needs still gets an entry,
    /// so its attempts are reported as failed.
    pub fn from_config(config: &AppConfig) -> Self {
        let alerts = &config.alerts;
        let mut manager = Self::new(
            Duration::from_secs(alerts.timeout_secs),
            AlertPolicy::from_config(config),
        );

        for channel in AlertChannel::ALL {
            let channel_config = match channel {
                AlertChannel::Slack => &alerts.slack,
                AlertChannel::Teams => &alerts.teams,
                AlertChannel::Webhook => &alerts.webhook,
                AlertChannel::Email => {
                    if alerts.email_enabled {
                        warn!("Email alerts enabled but no email sink is registered");
                        manager.register(channel, Arc::new(UnconfiguredSink::new("email transport")));
                    }
                    continue;
                }
            };

            match channel_config.url.as_deref() {
                Some(url) if channel_config.is_active() => {
                    let sink = HttpSink::new(channel, url).with_slack_channel(&alerts.slack_channel);
                    manager.register(channel, Arc::new(sink));
                }
                _ if channel_config.enabled => {
                    warn!(channel = %channel, "Channel enabled without a URL");
                    manager.register(channel, Arc::new(UnconfiguredSink::new("webhook url")));
                }
                _ => {}
            }
        }

        info!(
            channels = ?manager.enabled_channels(),
            timeout_secs = alerts.timeout_secs,
            "Alert manager initialized"
        );
        manager
    }

    pub fn policy(&self) -> &AlertPolicy {
        &self.policy
    }

    /// Register (or replace) the sink for a channel; it starts enabled
    pub fn register(&mut self, channel: AlertChannel, sink: Arc<dyn NotificationSink>) {
        self.channels.insert(channel, ChannelEntry { enabled: true, sink });
    }

    /// Enable or disable a registered channel. Returns false if none is registered.
    pub fn set_enabled(&mut self, channel: AlertChannel, enabled: bool) -> bool {
        match self.channels.get_mut(&channel) {
            Some(entry) => {
                entry.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn enabled_channels(&self) -> Vec<AlertChannel> {
        self.channels
            .iter()
            .filter(|(_, entry)| entry.enabled)
            .map(|(channel, _)| *channel)
            .collect()
    }

    /// Deliver one payload to every enabled channel concurrently.
    ///
    /// Each attempt runs as its own task, so a sink that panics is recorded
    /// as a failure of its channel only.
    pub async fn dispatch(&self, payload: &AlertPayload) -> DispatchReport {
        let shared = Arc::new(payload.clone());
        let attempts: Vec<_> = self
            .channels
            .iter()
            .filter(|(_, entry)| entry.enabled)
            .map(|(channel, entry)| {
                let sink = entry.sink.clone();
                let payload = shared.clone();
                let timeout = self.timeout;
                let handle = tokio::spawn(async move {
                    match tokio::time::timeout(timeout, sink.deliver(&payload)).await {
                        Ok(result) => result,
                        Err(_) => Err(DeliveryError::Timeout(timeout)),
                    }
                });
                let channel = *channel;
                async move {
                    let result = handle
                        .await
                        .unwrap_or_else(|e| Err(DeliveryError::Aborted(e.to_string())));
                    (channel, result)
                }
            })
            .collect();

        let mut report = DispatchReport::default();
        for (channel, result) in join_all(attempts).await {
            let outcome = match result {
                Ok(()) => {
                    info!(channel = %channel, title = %payload.title, "Alert delivered");
                    DeliveryOutcome::Delivered
                }
                Err(e) => {
                    error!(channel = %channel, title = %payload.title, error = %e, "Alert delivery failed");
                    DeliveryOutcome::Failed { reason: e.to_string() }
                }
            };
            report.outcomes.insert(channel, outcome);
        }

        report
    }

    /// Build a payload and dispatch it
    pub async fn send_alert(
        &self,
        title: &str,
        message: &str,
        severity: AlertSeverity,
        metrics: BTreeMap<String, Value>,
        metadata: BTreeMap<String, Value>,
    ) -> DispatchReport {
        let payload = AlertPayload::new(title, message, severity)
            .with_metrics(metrics)
            .with_metadata_map(metadata);
        self.dispatch(&payload).await
    }

    pub async fn send_drift_alert(&self, feature_name: &str, drift_score: f64) -> DispatchReport {
        let payload = self
            .policy
            .drift_alert(feature_name, drift_score, self.policy.drift_threshold);
        self.dispatch(&payload).await
    }

    pub async fn send_fraud_spike_alert(&self, current_rate: f64, expected_rate: f64) -> DispatchReport {
        let payload = self.policy.fraud_spike_alert(current_rate, expected_rate);
        self.dispatch(&payload).await
    }
}
