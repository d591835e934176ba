//! Alert payload data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Alert severity, lowest to highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Info => "info",
            AlertSeverity::Warning => "warning",
            AlertSeverity::Error => "error",
            AlertSeverity::Critical => "critical",
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification channels an alert can be fanned out to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertChannel {
    Slack,
    Teams,
    Email,
    Webhook,
}

impl AlertChannel {
    /// All channels in dispatch order
    pub const ALL: [AlertChannel; 4] = [
        AlertChannel::Slack,
        AlertChannel::Teams,
        AlertChannel::Email,
        AlertChannel::Webhook,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertChannel::Slack => "slack",
            AlertChannel::Teams => "teams",
            AlertChannel::Email => "email",
            AlertChannel::Webhook => "webhook",
        }
    }
}

impl fmt::Display for AlertChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured alert handed to notification sinks.
///
/// Built once and never mutated after it leaves the builder methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPayload {
    /// Short headline
    pub title: String,

    /// Human readable body
    pub message: String,

    /// Severity classification
    pub severity: AlertSeverity,

    /// Creation time, serialized as ISO-8601
    pub timestamp: DateTime<Utc>,

    /// Numeric context for the alert (scores, thresholds, rates)
    #[serde(default)]
    pub metrics: BTreeMap<String, Value>,

    /// Free-form labels (alert type, model name, ...)
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl AlertPayload {
    /// Create a new alert stamped with the current time
    pub fn new(title: impl Into<String>, message: impl Into<String>, severity: AlertSeverity) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            severity,
            timestamp: Utc::now(),
            metrics: BTreeMap::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a metric value
    pub fn with_metric(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metrics.insert(key.to_string(), value.into());
        self
    }

    /// Attach a metadata label
    pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Replace all metrics at once
    pub fn with_metrics(mut self, metrics: BTreeMap<String, Value>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Replace all metadata at once
    pub fn with_metadata_map(mut self, metadata: BTreeMap<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Look up a numeric metric
    pub fn metric_f64(&self, key: &str) -> Option<f64> {
        self.metrics.get(key).and_then(Value::as_f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(AlertSeverity::Info < AlertSeverity::Warning);
        assert!(AlertSeverity::Warning < AlertSeverity::Error);
        assert!(AlertSeverity::Error < AlertSeverity::Critical);
    }

    #[test]
    fn test_alert_payload_wire_format() {
        let alert = AlertPayload::new("Title", "Body", AlertSeverity::Critical)
            .with_metric("drift_score", 0.42)
            .with_metadata("alert_type", "data_drift");

        let json: Value = serde_json::to_value(&alert).unwrap();

        assert_eq!(json["title"], "Title");
        assert_eq!(json["severity"], "critical");
        assert_eq!(json["metrics"]["drift_score"], 0.42);
        assert_eq!(json["metadata"]["alert_type"], "data_drift");
        // chrono serializes DateTime<Utc> as RFC 3339
        let ts = json["timestamp"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(ts).is_ok());
    }

    #[test]
    fn test_channel_names() {
        let names: Vec<&str> = AlertChannel::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(names, vec!["slack", "teams", "email", "webhook"]);
        assert_eq!(
            serde_json::to_string(&AlertChannel::Teams).unwrap(),
            "\"teams\""
        );
    }
}
