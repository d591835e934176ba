//! Drift report data structures

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// PSI-based drift severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriftSeverity {
    None,
    Moderate,
    Significant,
}

impl DriftSeverity {
    /// Classify a PSI value. Depends on PSI alone.
    pub fn from_psi(psi: f64, thresholds: &SeverityThresholds) -> Self {
        if psi < thresholds.moderate {
            DriftSeverity::None
        } else if psi < thresholds.significant {
            DriftSeverity::Moderate
        } else {
            DriftSeverity::Significant
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DriftSeverity::None => "none",
            DriftSeverity::Moderate => "moderate",
            DriftSeverity::Significant => "significant",
        }
    }
}

impl fmt::Display for DriftSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// PSI boundaries for severity classification (lower bounds, inclusive)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeverityThresholds {
    pub moderate: f64,
    pub significant: f64,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            moderate: 0.1,
            significant: 0.2,
        }
    }
}

/// Drift statistics for one feature in one monitoring run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftFinding {
    /// Population Stability Index against the reference window
    pub psi: f64,

    /// Two-sample Kolmogorov-Smirnov statistic
    pub ks_statistic: f64,

    /// Asymptotic KS p-value
    pub ks_p_value: f64,

    /// PSI over threshold or KS p-value under threshold
    pub drift_detected: bool,

    /// Severity derived from PSI
    pub drift_severity: DriftSeverity,
}

/// Per-feature outcome: computed statistics, or the reason they could not
/// be computed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureDrift {
    Computed(DriftFinding),
    Unavailable { unavailable: String },
}

impl FeatureDrift {
    pub fn finding(&self) -> Option<&DriftFinding> {
        match self {
            FeatureDrift::Computed(finding) => Some(finding),
            FeatureDrift::Unavailable { .. } => None,
        }
    }

    pub fn drift_detected(&self) -> bool {
        self.finding().map(|f| f.drift_detected).unwrap_or(false)
    }
}

/// Findings of one run, keyed and ordered by feature name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriftReport {
    pub features: BTreeMap<String, FeatureDrift>,
}

impl DriftReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn get(&self, feature: &str) -> Option<&FeatureDrift> {
        self.features.get(feature)
    }

    /// Features with drift detected, highest PSI first
    pub fn drifted(&self) -> Vec<(&str, &DriftFinding)> {
        let mut drifted: Vec<(&str, &DriftFinding)> = self
            .features
            .iter()
            .filter_map(|(name, outcome)| outcome.finding().map(|f| (name.as_str(), f)))
            .filter(|(_, f)| f.drift_detected)
            .collect();
        drifted.sort_by(|a, b| b.1.psi.total_cmp(&a.1.psi).then_with(|| a.0.cmp(b.0)));
        drifted
    }

    /// Features whose statistics could not be computed
    pub fn unavailable(&self) -> Vec<&str> {
        self.features
            .iter()
            .filter(|(_, outcome)| outcome.finding().is_none())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Plain-text summary: totals and up to five drifted features by PSI
    pub fn summary(&self) -> String {
        let drifted = self.drifted();

        let mut summary = String::from("Drift Detection Summary:\n");
        summary.push_str(&format!("  Total features monitored: {}\n", self.len()));
        summary.push_str(&format!("  Features with drift: {}\n", drifted.len()));

        if !drifted.is_empty() {
            summary.push_str("\n  Critical features:\n");
            for (name, finding) in drifted.iter().take(5) {
                summary.push_str(&format!("    - {}: PSI = {:.4}\n", name, finding.psi));
            }
        }

        summary
    }
}

/// Fraud rates measured at the serving layer's operating threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatingPointRates {
    pub threshold: f64,
    pub reference_fraud_rate: f64,
    pub current_fraud_rate: f64,
}

/// Prediction-score drift between the reference and current windows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetDriftFinding {
    /// Fixed decision boundary used for the rates below
    pub decision_boundary: f64,
    pub reference_fraud_rate: f64,
    pub current_fraud_rate: f64,
    /// Relative change of the fraud rate, 0 when the reference rate is 0
    pub fraud_rate_change: f64,
    /// PSI of the raw score distributions
    pub psi: f64,
    pub chi2_statistic: f64,
    pub chi2_p_value: f64,
    pub drift_detected: bool,
    /// Rates at the serving threshold, when one is configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_point: Option<OperatingPointRates>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(psi: f64, drift: bool) -> FeatureDrift {
        FeatureDrift::Computed(DriftFinding {
            psi,
            ks_statistic: 0.0,
            ks_p_value: 1.0,
            drift_detected: drift,
            drift_severity: DriftSeverity::from_psi(psi, &SeverityThresholds::default()),
        })
    }

    #[test]
    fn test_severity_boundaries() {
        let t = SeverityThresholds::default();

        assert_eq!(DriftSeverity::from_psi(0.0, &t), DriftSeverity::None);
        assert_eq!(DriftSeverity::from_psi(0.0999, &t), DriftSeverity::None);
        assert_eq!(DriftSeverity::from_psi(0.1, &t), DriftSeverity::Moderate);
        assert_eq!(DriftSeverity::from_psi(0.1999, &t), DriftSeverity::Moderate);
        assert_eq!(DriftSeverity::from_psi(0.2, &t), DriftSeverity::Significant);
        assert_eq!(DriftSeverity::from_psi(5.0, &t), DriftSeverity::Significant);
    }

    #[test]
    fn test_severity_is_monotonic() {
        let t = SeverityThresholds::default();
        let mut last = DriftSeverity::None;
        for i in 0..100 {
            let s = DriftSeverity::from_psi(i as f64 * 0.005, &t);
            assert!(s >= last);
            last = s;
        }
    }

    #[test]
    fn test_summary_orders_by_psi_and_caps_at_five() {
        let mut report = DriftReport::new();
        for (i, psi) in [0.3, 0.9, 0.25, 0.5, 0.7, 0.4].iter().enumerate() {
            report.features.insert(format!("f{}", i), finding(*psi, true));
        }
        report.features.insert("quiet".into(), finding(0.01, false));

        let summary = report.summary();

        assert!(summary.contains("Total features monitored: 7"));
        assert!(summary.contains("Features with drift: 6"));
        let first = summary.find("f1: PSI = 0.9000").unwrap();
        let second = summary.find("f4: PSI = 0.7000").unwrap();
        assert!(first < second);
        // lowest drifted PSI is cut by the top-5 limit
        assert!(!summary.contains("f2:"));
        assert!(!summary.contains("quiet"));
    }

    #[test]
    fn test_report_wire_format() {
        let mut report = DriftReport::new();
        report.features.insert("amount".into(), finding(0.15, false));
        report.features.insert(
            "age".into(),
            FeatureDrift::Unavailable {
                unavailable: "empty sample".into(),
            },
        );

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["amount"]["drift_severity"], "moderate");
        assert_eq!(json["amount"]["drift_detected"], false);
        assert_eq!(json["age"]["unavailable"], "empty sample");

        let back: DriftReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, report);
    }
}
