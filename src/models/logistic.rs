//! Linear-logit scorer over named features

use super::FraudModel;
use crate::types::frame::FeatureRow;
use anyhow::Result;
use std::collections::HashMap;

/// `p_fraud = sigmoid(bias + Σ weight · value)`. Features absent from a row
/// contribute nothing.
#[derive(Debug, Clone)]
pub struct LogisticModel {
    weights: HashMap<String, f64>,
    bias: f64,
    version: String,
}

impl LogisticModel {
    pub fn new(bias: f64, version: impl ToString) -> Self {
        Self {
            weights: HashMap::new(),
            bias,
            version: version.to_string(),
        }
    }

    pub fn with_weight(mut self, feature: &str, weight: f64) -> Self {
        self.weights.insert(feature.to_string(), weight);
        self
    }

    /// Fraud probability for one row
    pub fn score(&self, row: &FeatureRow) -> f64 {
        let logit = self.weights.iter().fold(self.bias, |acc, (name, weight)| {
            acc + row.get(name).map_or(0.0, |v| weight * v)
        });
        1.0 / (1.0 + (-logit).exp())
    }
}

impl FraudModel for LogisticModel {
    fn predict_proba(&self, rows: &[FeatureRow]) -> Result<Vec<[f64; 2]>> {
        Ok(rows
            .iter()
            .map(|row| {
                let fraud = self.score(row);
                [1.0 - fraud, fraud]
            })
            .collect())
    }

    fn version(&self) -> &str {
        &self.version
    }
}
