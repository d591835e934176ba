//! Feature and target drift detection for the fraud model

use super::chi_square::rate_chi_square;
use super::ks::{ks_two_sample, KsResult};
use super::psi::psi;
use super::{check_sample, DriftError};
use crate::config::{DriftConfig, ServingConfig};
use crate::types::drift::{
    DriftFinding, DriftReport, DriftSeverity, FeatureDrift, OperatingPointRates,
    SeverityThresholds, TargetDriftFinding,
};
use crate::types::frame::FeatureFrame;
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Compares current windows against a reference window.
///
/// Stateless apart from its thresholds; safe to share across threads.
#[derive(Debug, Clone)]
pub struct FraudDriftDetector {
    /// PSI above which drift is flagged
    psi_threshold: f64,
    /// KS p-value below which drift is flagged
    ks_threshold: f64,
    psi_bins: usize,
    psi_epsilon: f64,
    severity: SeverityThresholds,
    rate_change_threshold: f64,
    /// Diagnostic fraud boundary (score > boundary)
    decision_boundary: f64,
    /// Serving threshold (score >= threshold), reported alongside
    operating_threshold: Option<f64>,
}

impl Default for FraudDriftDetector {
    fn default() -> Self {
        Self::new(0.2, 0.05)
    }
}

impl FraudDriftDetector {
    /// Detector with the given flagging thresholds and default binning
    pub fn new(psi_threshold: f64, ks_threshold: f64) -> Self {
        let defaults = DriftConfig::default();
        Self {
            psi_threshold,
            ks_threshold,
            psi_bins: defaults.psi_bins,
            psi_epsilon: defaults.psi_epsilon,
            severity: defaults.severity,
            rate_change_threshold: defaults.rate_change_threshold,
            decision_boundary: defaults.decision_boundary,
            operating_threshold: None,
        }
    }

    /// Detector configured from the drift and serving sections
    pub fn from_config(drift: &DriftConfig, serving: &ServingConfig) -> Self {
        Self {
            psi_threshold: drift.psi_threshold,
            ks_threshold: drift.ks_threshold,
            psi_bins: drift.psi_bins,
            psi_epsilon: drift.psi_epsilon,
            severity: drift.severity.clone(),
            rate_change_threshold: drift.rate_change_threshold,
            decision_boundary: drift.decision_boundary,
            operating_threshold: serving.operating_threshold,
        }
    }

    /// Also report fraud rates at the serving layer's threshold
    pub fn with_operating_threshold(mut self, threshold: f64) -> Self {
        self.operating_threshold = Some(threshold);
        self
    }

    pub fn psi_threshold(&self) -> f64 {
        self.psi_threshold
    }

    pub fn calculate_psi(&self, reference: &[f64], current: &[f64]) -> Result<f64, DriftError> {
        psi(reference, current, self.psi_bins, self.psi_epsilon)
    }

    pub fn calculate_ks_test(&self, reference: &[f64], current: &[f64]) -> Result<KsResult, DriftError> {
        ks_two_sample(reference, current)
    }

    pub fn classify_severity(&self, psi: f64) -> DriftSeverity {
        DriftSeverity::from_psi(psi, &self.severity)
    }

    /// PSI, KS and the drift decision for one pair of samples
    pub fn compare(&self, reference: &[f64], current: &[f64]) -> Result<DriftFinding, DriftError> {
        let psi = self.calculate_psi(reference, current)?;
        let ks = self.calculate_ks_test(reference, current)?;

        Ok(DriftFinding {
            psi,
            ks_statistic: ks.statistic,
            ks_p_value: ks.p_value,
            drift_detected: psi > self.psi_threshold || ks.p_value < self.ks_threshold,
            drift_severity: self.classify_severity(psi),
        })
    }

    /// Per-feature drift between two windows.
    ///
    /// Features missing from either window are skipped with a warning.
    /// Features whose statistics cannot be computed are kept as unavailable
    /// entries. Features are evaluated in parallel.
    pub fn detect_feature_drift(
        &self,
        reference: &FeatureFrame,
        current: &FeatureFrame,
        features: &[String],
    ) -> DriftReport {
        let features: BTreeMap<String, FeatureDrift> = features
            .par_iter()
            .filter_map(|feature| {
                let (Some(ref_values), Some(cur_values)) =
                    (reference.values(feature), current.values(feature))
                else {
                    warn!(feature = %feature, "Feature not found in data, skipping");
                    return None;
                };

                let outcome = match self.compare(&ref_values, &cur_values) {
                    Ok(finding) => {
                        debug!(
                            feature = %feature,
                            psi = finding.psi,
                            ks_p_value = finding.ks_p_value,
                            drift = finding.drift_detected,
                            "Feature compared"
                        );
                        FeatureDrift::Computed(finding)
                    }
                    Err(e) => {
                        warn!(feature = %feature, error = %e, "Drift statistics unavailable");
                        FeatureDrift::Unavailable {
                            unavailable: e.to_string(),
                        }
                    }
                };

                Some((feature.clone(), outcome))
            })
            .collect();

        let report = DriftReport { features };
        info!(
            monitored = report.len(),
            drifted = report.drifted().len(),
            unavailable = report.unavailable().len(),
            "Feature drift computed"
        );
        report
    }

    /// Drift between reference and current fraud-score distributions
    pub fn detect_target_drift(
        &self,
        reference_scores: &[f64],
        current_scores: &[f64],
    ) -> Result<TargetDriftFinding, DriftError> {
        check_sample(reference_scores, "reference")?;
        check_sample(current_scores, "current")?;

        let boundary = self.decision_boundary;
        let reference_rate = rate(reference_scores, |s| s > boundary);
        let current_rate = rate(current_scores, |s| s > boundary);

        let fraud_rate_change = if reference_rate > 0.0 {
            (current_rate - reference_rate).abs() / reference_rate
        } else {
            0.0
        };

        let psi = self.calculate_psi(reference_scores, current_scores)?;
        let chi = rate_chi_square(current_rate, reference_rate)?;

        let operating_point = self.operating_threshold.map(|threshold| OperatingPointRates {
            threshold,
            reference_fraud_rate: rate(reference_scores, |s| s >= threshold),
            current_fraud_rate: rate(current_scores, |s| s >= threshold),
        });

        let drift_detected =
            psi > self.psi_threshold || fraud_rate_change > self.rate_change_threshold;

        info!(
            reference_rate,
            current_rate,
            fraud_rate_change,
            psi,
            drift = drift_detected,
            "Target drift computed"
        );

        Ok(TargetDriftFinding {
            decision_boundary: boundary,
            reference_fraud_rate: reference_rate,
            current_fraud_rate: current_rate,
            fraud_rate_change,
            psi,
            chi2_statistic: chi.statistic,
            chi2_p_value: chi.p_value,
            drift_detected,
            operating_point,
        })
    }
}

fn rate(scores: &[f64], is_fraud: impl Fn(f64) -> bool) -> f64 {
    scores.iter().filter(|&&s| is_fraud(s)).count() as f64 / scores.len() as f64
}
