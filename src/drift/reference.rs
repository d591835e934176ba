//! Reference and current window snapshots

use crate::types::frame::FeatureFrame;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Frozen baseline sample of one feature (or of prediction scores)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceDistribution {
    pub feature_name: String,
    /// Observed values with missing cells dropped
    pub values: Vec<f64>,
    pub captured_at: DateTime<Utc>,
    pub model_version: String,
}

/// Name used for the prediction-score distribution of a snapshot
pub const PREDICTION_SCORES: &str = "__prediction_scores__";

/// Feature window plus the model's fraud scores for the same rows.
///
/// Captured once at deployment for the reference, refreshed for every
/// current window. Never modified after capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSnapshot {
    pub captured_at: DateTime<Utc>,
    pub model_version: String,
    pub features: FeatureFrame,
    /// Fraud probability per row
    #[serde(default)]
    pub prediction_scores: Vec<f64>,
}

impl WindowSnapshot {
    /// Capture a snapshot stamped with the current time
    pub fn capture(features: FeatureFrame, prediction_scores: Vec<f64>, model_version: &str) -> Self {
        Self {
            captured_at: Utc::now(),
            model_version: model_version.to_string(),
            features,
            prediction_scores,
        }
    }

    /// The baseline distribution of one feature
    pub fn distribution(&self, feature: &str) -> Option<ReferenceDistribution> {
        let values = if feature == PREDICTION_SCORES {
            self.prediction_scores.clone()
        } else {
            self.features.values(feature)?
        };

        Some(ReferenceDistribution {
            feature_name: feature.to_string(),
            values,
            captured_at: self.captured_at,
            model_version: self.model_version.clone(),
        })
    }

    /// Load a snapshot from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        let snapshot: WindowSnapshot = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse snapshot {}", path.display()))?;

        info!(
            path = %path.display(),
            rows = snapshot.features.row_count(),
            scores = snapshot.prediction_scores.len(),
            model_version = %snapshot.model_version,
            "Snapshot loaded"
        );
        Ok(snapshot)
    }

    /// Write the snapshot as JSON, creating parent directories
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string(self).context("Failed to serialize snapshot")?;
        fs::write(path, json).with_context(|| format!("Failed to write snapshot {}", path.display()))
    }
}
