//! Alert payloads for drift and fraud-rate findings

use crate::config::AppConfig;
use crate::types::alert::{AlertPayload, AlertSeverity};
use crate::types::drift::{DriftReport, TargetDriftFinding};

/// Severity escalation points and labels for generated alerts
#[derive(Debug, Clone)]
pub struct AlertPolicy {
    /// Drift score at or above which a drift alert is critical
    pub drift_critical_score: f64,
    /// Percent increase at or above which a spike alert is critical
    pub spike_critical_pct: f64,
    /// Threshold quoted in drift alerts
    pub drift_threshold: f64,
    /// Model label put in alert metadata
    pub model_name: String,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            drift_critical_score: 0.3,
            spike_critical_pct: 50.0,
            drift_threshold: 0.2,
            model_name: "fraud-detection-model".to_string(),
        }
    }
}

/// Relative change of the fraud rate in percent, 0 when nothing was expected
pub fn spike_increase_pct(current_rate: f64, expected_rate: f64) -> f64 {
    if expected_rate > 0.0 {
        (current_rate - expected_rate).abs() / expected_rate * 100.0
    } else {
        0.0
    }
}

impl AlertPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            drift_critical_score: config.alerts.drift_critical_score,
            spike_critical_pct: config.alerts.spike_critical_pct,
            drift_threshold: config.drift.psi_threshold,
            model_name: config.serving.model_name.clone(),
        }
    }

    /// Alert for a drifted feature
    pub fn drift_alert(&self, feature_name: &str, drift_score: f64, threshold: f64) -> AlertPayload {
        let severity = if drift_score < self.drift_critical_score {
            AlertSeverity::Warning
        } else {
            AlertSeverity::Critical
        };

        AlertPayload::new(
            format!("Data Drift Detected: {}", feature_name),
            format!(
                "Drift score ({:.4}) exceeds threshold ({:.4}). Consider retraining the model.",
                drift_score, threshold
            ),
            severity,
        )
        .with_metric("drift_score", drift_score)
        .with_metric("threshold", threshold)
        .with_metric("feature", feature_name)
        .with_metadata("alert_type", "data_drift")
        .with_metadata("model", self.model_name.as_str())
    }

    /// Alert for a fraud rate above expectations
    pub fn fraud_spike_alert(&self, current_rate: f64, expected_rate: f64) -> AlertPayload {
        let increase = spike_increase_pct(current_rate, expected_rate);
        let severity = if increase < self.spike_critical_pct {
            AlertSeverity::Warning
        } else {
            AlertSeverity::Critical
        };

        AlertPayload::new(
            "Fraud Rate Spike Detected",
            format!(
                "Current fraud rate ({:.2}%) is {:.1}% higher than expected ({:.2}%). Investigate immediately.",
                current_rate * 100.0,
                increase,
                expected_rate * 100.0
            ),
            severity,
        )
        .with_metric("current_fraud_rate", current_rate)
        .with_metric("expected_fraud_rate", expected_rate)
        .with_metric("increase_pct", increase)
        .with_metadata("alert_type", "fraud_spike")
    }

    /// Alerts warranted by one monitoring run.
    ///
    /// One drift alert per drifted feature (score = PSI, highest first), and
    /// a spike alert when target drift is detected with the current fraud
    /// rate above `expected_rate` (the reference rate when not given).
    pub fn alerts_for_run(
        &self,
        report: &DriftReport,
        target: Option<&TargetDriftFinding>,
        expected_rate: Option<f64>,
    ) -> Vec<AlertPayload> {
        let mut alerts: Vec<AlertPayload> = report
            .drifted()
            .into_iter()
            .map(|(name, finding)| self.drift_alert(name, finding.psi, self.drift_threshold))
            .collect();

        if let Some(target) = target.filter(|t| t.drift_detected) {
            let expected = expected_rate.unwrap_or(target.reference_fraud_rate);
            if target.current_fraud_rate > expected {
                alerts.push(self.fraud_spike_alert(target.current_fraud_rate, expected));
            }
        }

        alerts
    }
}

/// Drift alert with the default policy
pub fn drift_alert(feature_name: &str, drift_score: f64, threshold: f64) -> AlertPayload {
    AlertPolicy::default().drift_alert(feature_name, drift_score, threshold)
}

/// Fraud spike alert with the default policy
pub fn fraud_spike_alert(current_rate: f64, expected_rate: f64) -> AlertPayload {
    AlertPolicy::default().fraud_spike_alert(current_rate, expected_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::drift::{DriftFinding, DriftSeverity, FeatureDrift};

    #[test]
    fn test_drift_alert_severity() {
        assert_eq!(drift_alert("amount", 0.25, 0.2).severity, AlertSeverity::Warning);
        assert_eq!(drift_alert("amount", 0.3, 0.2).severity, AlertSeverity::Critical);
        assert_eq!(drift_alert("amount", 1.5, 0.2).severity, AlertSeverity::Critical);
    }

    #[test]
    fn test_drift_alert_content() {
        let alert = drift_alert("amount", 0.25, 0.2);

        assert_eq!(alert.title, "Data Drift Detected: amount");
        assert!(alert.message.contains("0.2500"));
        assert!(alert.message.contains("0.2000"));
        assert!(alert.message.contains("retraining"));
        assert_eq!(alert.metric_f64("drift_score"), Some(0.25));
        assert_eq!(alert.metrics["feature"], "amount");
        assert_eq!(alert.metadata["alert_type"], "data_drift");
        assert_eq!(alert.metadata["model"], "fraud-detection-model");
    }

    #[test]
    fn test_fraud_spike_doubling_is_critical() {
        let alert = fraud_spike_alert(0.02, 0.01);

        assert_eq!(alert.severity, AlertSeverity::Critical);
        assert_eq!(alert.metric_f64("increase_pct"), Some(100.0));
        assert!(alert.message.contains("(2.00%)"));
        assert!(alert.message.contains("100.0% higher"));
        assert_eq!(alert.metadata["alert_type"], "fraud_spike");
    }

    #[test]
    fn test_fraud_spike_small_increase_is_warning() {
        let alert = fraud_spike_alert(0.012, 0.01);
        assert_eq!(alert.severity, AlertSeverity::Warning);
        assert!((alert.metric_f64("increase_pct").unwrap() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_expected_rate() {
        assert_eq!(spike_increase_pct(0.05, 0.0), 0.0);
        assert_eq!(fraud_spike_alert(0.05, 0.0).severity, AlertSeverity::Warning);
    }

    fn finding(psi: f64, drift: bool) -> FeatureDrift {
        FeatureDrift::Computed(DriftFinding {
            psi,
            ks_statistic: 0.1,
            ks_p_value: 0.5,
            drift_detected: drift,
            drift_severity: DriftSeverity::Significant,
        })
    }

    fn target(reference: f64, current: f64, drift: bool) -> TargetDriftFinding {
        TargetDriftFinding {
            decision_boundary: 0.5,
            reference_fraud_rate: reference,
            current_fraud_rate: current,
            fraud_rate_change: spike_increase_pct(current, reference) / 100.0,
            psi: 0.0,
            chi2_statistic: 0.0,
            chi2_p_value: 1.0,
            drift_detected: drift,
            operating_point: None,
        }
    }

    #[test]
    fn test_alerts_for_run() {
        let mut report = DriftReport::new();
        report.features.insert("amount".into(), finding(0.9, true));
        report.features.insert("age".into(), finding(0.25, true));
        report.features.insert("stable".into(), finding(0.01, false));

        let policy = AlertPolicy::default();
        let alerts = policy.alerts_for_run(&report, Some(&target(0.01, 0.03, true)), None);

        assert_eq!(alerts.len(), 3);
        assert_eq!(alerts[0].title, "Data Drift Detected: amount");
        assert_eq!(alerts[1].title, "Data Drift Detected: age");
        assert_eq!(alerts[2].title, "Fraud Rate Spike Detected");
        assert_eq!(alerts[2].metric_f64("expected_fraud_rate"), Some(0.01));
    }

    #[test]
    fn test_no_spike_alert_for_falling_rate_or_no_drift() {
        let policy = AlertPolicy::default();
        let report = DriftReport::new();

        assert!(policy
            .alerts_for_run(&report, Some(&target(0.05, 0.01, true)), None)
            .is_empty());
        assert!(policy
            .alerts_for_run(&report, Some(&target(0.01, 0.012, false)), None)
            .is_empty());
        // explicit expectation overrides the reference rate
        assert_eq!(
            policy
                .alerts_for_run(&report, Some(&target(0.05, 0.04, true)), Some(0.02))
                .len(),
            1
        );
    }
}
