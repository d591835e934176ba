//! Periodic monitoring job: compare a current window against the frozen
//! reference, write the run document and raise alerts.

use crate::alerts::{AlertManager, AlertPolicy, DispatchReport};
use crate::config::AppConfig;
use crate::drift::{FraudDriftDetector, WindowSnapshot};
use crate::metrics::MonitoringMetrics;
use crate::types::alert::AlertPayload;
use crate::types::drift::{DriftReport, TargetDriftFinding};
use crate::types::frame::FeatureFrame;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Mean and sample standard deviation of one feature in a window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureStats {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1); 0 for fewer than two values
    pub std: f64,
}

impl FeatureStats {
    pub fn from_values(values: &[f64]) -> Self {
        let count = values.len();
        if count == 0 {
            return Self {
                count,
                mean: 0.0,
                std: 0.0,
            };
        }

        let mean = values.iter().sum::<f64>() / count as f64;
        let std = if count > 1 {
            let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (count - 1) as f64).sqrt()
        } else {
            0.0
        };

        Self { count, mean, std }
    }
}

/// Health snapshot: per-feature summary statistics of a window
pub fn health_snapshot(frame: &FeatureFrame, features: &[String]) -> BTreeMap<String, FeatureStats> {
    features
        .iter()
        .filter_map(|name| {
            let values = frame.values(name)?;
            Some((name.clone(), FeatureStats::from_values(&values)))
        })
        .collect()
}

/// Target drift result, or why it could not be computed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetDrift {
    Computed(TargetDriftFinding),
    Unavailable { unavailable: String },
}

impl TargetDrift {
    pub fn finding(&self) -> Option<&TargetDriftFinding> {
        match self {
            TargetDrift::Computed(finding) => Some(finding),
            TargetDrift::Unavailable { .. } => None,
        }
    }
}

/// Output document of one monitoring run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringRun {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub model_version: String,
    pub reference_captured_at: DateTime<Utc>,
    pub current_captured_at: DateTime<Utc>,
    pub feature_drift: DriftReport,
    pub target_drift: TargetDrift,
    pub summary: String,
    pub health: BTreeMap<String, FeatureStats>,
    pub alerts: Vec<AlertPayload>,
    /// One entry per alert, same order
    #[serde(default)]
    pub deliveries: Vec<DispatchReport>,
}

impl MonitoringRun {
    /// Write the run as pretty JSON, creating parent directories
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize monitoring run")?;
        fs::write(path, json).with_context(|| format!("Failed to write report {}", path.display()))
    }
}

/// Compares current windows against one reference snapshot
pub struct MonitoringJob {
    reference: WindowSnapshot,
    detector: FraudDriftDetector,
    policy: AlertPolicy,
    features: Vec<String>,
    expected_fraud_rate: Option<f64>,
    report_path: Option<PathBuf>,
    alerts: Option<AlertManager>,
    metrics: Option<Arc<MonitoringMetrics>>,
}

impl MonitoringJob {
    /// Job over every feature of the reference window, without sinks or report file
    pub fn new(reference: WindowSnapshot, detector: FraudDriftDetector) -> Self {
        let features = reference.features.feature_names().map(String::from).collect();
        Self {
            reference,
            detector,
            policy: AlertPolicy::default(),
            features,
            expected_fraud_rate: None,
            report_path: None,
            alerts: None,
            metrics: None,
        }
    }

    /// Job wired from configuration: detector, policy, feature list, report
    /// path and alert channels
    pub fn from_config(config: &AppConfig, reference: WindowSnapshot) -> Self {
        let detector = FraudDriftDetector::from_config(&config.drift, &config.serving);
        let mut job = Self::new(reference, detector)
            .with_policy(AlertPolicy::from_config(config))
            .with_report_path(&config.monitoring.report_path)
            .with_alert_manager(AlertManager::from_config(config));

        if !config.drift.features.is_empty() {
            job = job.with_features(config.drift.features.clone());
        }
        job.expected_fraud_rate = config.monitoring.expected_fraud_rate;

        info!(
            features = job.features.len(),
            reference_rows = job.reference.features.row_count(),
            reference_version = %job.reference.model_version,
            "Monitoring job initialized"
        );
        job
    }

    pub fn with_features(mut self, features: Vec<String>) -> Self {
        self.features = features;
        self
    }

    pub fn with_policy(mut self, policy: AlertPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_expected_fraud_rate(mut self, rate: f64) -> Self {
        self.expected_fraud_rate = Some(rate);
        self
    }

    pub fn with_report_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.report_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_alert_manager(mut self, manager: AlertManager) -> Self {
        self.alerts = Some(manager);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MonitoringMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn reference(&self) -> &WindowSnapshot {
        &self.reference
    }

    /// Compute drift, health and alert payloads for a current window
    pub fn evaluate(&self, current: &WindowSnapshot) -> MonitoringRun {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        let feature_drift =
            self.detector
                .detect_feature_drift(&self.reference.features, &current.features, &self.features);

        let target_drift = match self
            .detector
            .detect_target_drift(&self.reference.prediction_scores, &current.prediction_scores)
        {
            Ok(finding) => TargetDrift::Computed(finding),
            Err(e) => {
                warn!(run_id = %run_id, error = %e, "Target drift unavailable");
                TargetDrift::Unavailable {
                    unavailable: e.to_string(),
                }
            }
        };

        let alerts = self.policy.alerts_for_run(
            &feature_drift,
            target_drift.finding(),
            self.expected_fraud_rate,
        );

        MonitoringRun {
            run_id,
            started_at,
            model_version: current.model_version.clone(),
            reference_captured_at: self.reference.captured_at,
            current_captured_at: current.captured_at,
            summary: feature_drift.summary(),
            health: health_snapshot(&current.features, &self.features),
            feature_drift,
            target_drift,
            alerts,
            deliveries: Vec::new(),
        }
    }

    /// Evaluate, dispatch alerts, record metrics and write the run document
    pub async fn run(&self, current: &WindowSnapshot) -> Result<MonitoringRun> {
        let start = Instant::now();
        let mut run = self.evaluate(current);

        if let Some(manager) = &self.alerts {
            for alert in &run.alerts {
                let dispatch = manager.dispatch(alert).await;
                if let Some(metrics) = &self.metrics {
                    metrics.record_dispatch(&dispatch);
                }
                run.deliveries.push(dispatch);
            }
        }

        if let Some(path) = &self.report_path {
            run.write(path)?;
            info!(path = %path.display(), "Monitoring report written");
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_run(start.elapsed(), &run.feature_drift);
            metrics.record_scores(&current.prediction_scores);
            for alert in &run.alerts {
                metrics.record_alert(alert.severity);
            }
        }

        info!(
            run_id = %run.run_id,
            drifted = run.feature_drift.drifted().len(),
            target_drift = run.target_drift.finding().is_some_and(|t| t.drift_detected),
            alerts = run.alerts.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Monitoring run complete"
        );
        info!("\n{}", run.summary);

        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::{DeliveryError, NotificationSink};
    use crate::types::alert::{AlertChannel, AlertSeverity};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingSink {
        titles: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn deliver(&self, payload: &AlertPayload) -> Result<(), DeliveryError> {
            self.titles.lock().unwrap().push(payload.title.clone());
            Ok(())
        }
    }

    fn window(amounts: Vec<f64>, scores: Vec<f64>) -> WindowSnapshot {
        let frame = FeatureFrame::new()
            .with_column("amount", amounts)
            .with_column("stable", (0..10).map(f64::from).collect());
        WindowSnapshot::capture(frame, scores, "1.0.0")
    }

    fn reference() -> WindowSnapshot {
        window(
            vec![1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 10.0],
            vec![0.1, 0.2, 0.1, 0.3, 0.9, 0.2, 0.1, 0.4, 0.2, 0.1],
        )
    }

    #[test]
    fn test_feature_stats() {
        let stats = FeatureStats::from_values(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(stats.count, 8);
        assert!((stats.mean - 5.0).abs() < 1e-12);
        assert!((stats.std - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);

        let single = FeatureStats::from_values(&[3.0]);
        assert_eq!(single.std, 0.0);
        assert_eq!(FeatureStats::from_values(&[]).count, 0);
    }

    #[test]
    fn test_evaluate_flags_shifted_feature() {
        let job = MonitoringJob::new(reference(), FraudDriftDetector::default());
        let current = window(
            vec![10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 1.0],
            vec![0.1, 0.2, 0.1, 0.3, 0.9, 0.2, 0.1, 0.4, 0.2, 0.1],
        );

        let run = job.evaluate(&current);

        assert!(run.feature_drift.get("amount").unwrap().drift_detected());
        assert!(!run.feature_drift.get("stable").unwrap().drift_detected());
        let target = run.target_drift.finding().unwrap();
        assert!(!target.drift_detected);
        assert_eq!(run.alerts.len(), 1);
        assert_eq!(run.alerts[0].title, "Data Drift Detected: amount");
        assert!((run.health["amount"].mean - 9.1).abs() < 1e-9);
    }

    #[test]
    fn test_missing_scores_make_target_unavailable() {
        let job = MonitoringJob::new(reference(), FraudDriftDetector::default());
        let run = job.evaluate(&window(vec![1.0; 10], Vec::new()));

        assert!(run.target_drift.finding().is_none());
        assert_eq!(run.feature_drift.len(), 2);
    }

    #[test]
    fn test_configured_features_restrict_run() {
        let job = MonitoringJob::new(reference(), FraudDriftDetector::default())
            .with_features(vec!["stable".into(), "absent".into()]);
        let run = job.evaluate(&reference());

        assert_eq!(run.feature_drift.len(), 1);
        assert!(run.health.contains_key("stable"));
        assert!(!run.health.contains_key("absent"));
    }

    #[tokio::test]
    async fn test_run_dispatches_and_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let report_path = dir.path().join("reports/run.json");
        let sink = Arc::new(RecordingSink::default());
        let metrics = Arc::new(MonitoringMetrics::new());

        let mut manager = AlertManager::new(Duration::from_secs(10), AlertPolicy::default());
        manager.register(AlertChannel::Webhook, sink.clone());

        let job = MonitoringJob::new(reference(), FraudDriftDetector::default())
            .with_alert_manager(manager)
            .with_metrics(metrics.clone())
            .with_report_path(&report_path);

        // every score above the boundary: rate jumps from 0.1 to 1.0
        let current = window(vec![10.0; 10], vec![0.95; 10]);
        let run = job.run(&current).await.unwrap();

        let titles = sink.titles.lock().unwrap().clone();
        assert!(titles.contains(&"Data Drift Detected: amount".to_string()));
        assert!(titles.contains(&"Fraud Rate Spike Detected".to_string()));
        assert_eq!(run.deliveries.len(), run.alerts.len());
        assert!(run.deliveries.iter().all(DispatchReport::all_delivered));

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
        assert_eq!(written["run_id"], run.run_id.to_string());
        assert_eq!(written["feature_drift"]["amount"]["drift_detected"], true);
        assert_eq!(written["target_drift"]["drift_detected"], true);

        assert_eq!(
            metrics.get_alerts_by_severity()[&AlertSeverity::Critical],
            run.alerts
                .iter()
                .filter(|a| a.severity == AlertSeverity::Critical)
                .count() as u64
        );
        assert_eq!(metrics.get_score_distribution()[9], 10);
    }

    #[test]
    fn test_from_config_uses_reference_features_when_unset() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.monitoring.report_path = dir.path().join("r.json");

        let job = MonitoringJob::from_config(&config, reference());
        assert_eq!(job.features(), &["amount".to_string(), "stable".to_string()]);

        config.drift.features = vec!["amount".into()];
        let job = MonitoringJob::from_config(&config, reference());
        assert_eq!(job.features(), &["amount".to_string()]);
    }
}
