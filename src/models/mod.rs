//! Scoring-model collaborator used to produce prediction scores for snapshots

pub mod logistic;

pub use logistic::LogisticModel;

use crate::drift::reference::WindowSnapshot;
use crate::types::frame::{FeatureFrame, FeatureRow};
use anyhow::{ensure, Result};

/// A fraud classifier.
///
/// `predict_proba` returns `[p_normal, p_fraud]` for every input row, in
/// input order.
pub trait FraudModel: Send + Sync {
    fn predict_proba(&self, rows: &[FeatureRow]) -> Result<Vec<[f64; 2]>>;

    /// Model version stamped on snapshots
    fn version(&self) -> &str;
}

/// Fraud probability per row
pub fn fraud_scores(model: &dyn FraudModel, rows: &[FeatureRow]) -> Result<Vec<f64>> {
    let probabilities = model.predict_proba(rows)?;
    ensure!(
        probabilities.len() == rows.len(),
        "model returned {} predictions for {} rows",
        probabilities.len(),
        rows.len()
    );
    Ok(probabilities.into_iter().map(|[_, fraud]| fraud).collect())
}

/// Score a window of rows and freeze it as a snapshot
pub fn capture_snapshot(model: &dyn FraudModel, rows: &[FeatureRow]) -> Result<WindowSnapshot> {
    let scores = fraud_scores(model, rows)?;
    Ok(WindowSnapshot::capture(
        FeatureFrame::from_rows(rows),
        scores,
        model.version(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ShortModel;

    impl FraudModel for ShortModel {
        fn predict_proba(&self, _rows: &[FeatureRow]) -> Result<Vec<[f64; 2]>> {
            Ok(vec![[0.9, 0.1]])
        }

        fn version(&self) -> &str {
            "short"
        }
    }

    fn rows() -> Vec<FeatureRow> {
        (0..3)
            .map(|i| FeatureRow::from([("amount".to_string(), i as f64 * 100.0)]))
            .collect()
    }

    #[test]
    fn test_prediction_count_mismatch_is_error() {
        assert!(fraud_scores(&ShortModel, &rows()).is_err());
    }

    #[test]
    fn test_capture_snapshot() {
        let model = LogisticModel::new(-2.0, "1.0").with_weight("amount", 0.01);
        let snapshot = capture_snapshot(&model, &rows()).unwrap();

        assert_eq!(snapshot.features.row_count(), 3);
        assert_eq!(snapshot.prediction_scores.len(), 3);
        assert_eq!(snapshot.model_version, "1.0");
        // sigmoid(-2), sigmoid(-1), sigmoid(0)
        assert!(snapshot.prediction_scores[0] < snapshot.prediction_scores[1]);
        assert!((snapshot.prediction_scores[2] - 0.5).abs() < 1e-12);
    }
}
