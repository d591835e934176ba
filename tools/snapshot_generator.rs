//! Snapshot Generator
//!
//! Writes synthetic reference and current window snapshots for exercising
//! the monitoring daemon end to end.

use anyhow::Result;
use fraud_monitor::models::{capture_snapshot, LogisticModel};
use fraud_monitor::types::FeatureRow;
use rand::Rng;
use std::path::PathBuf;
use tracing::info;

/// Synthetic row generator
struct RowGenerator {
    rng: rand::rngs::ThreadRng,
    /// Multiplier applied to amounts, to simulate drift
    amount_scale: f64,
}

impl RowGenerator {
    fn new(amount_scale: f64) -> Self {
        Self {
            rng: rand::thread_rng(),
            amount_scale,
        }
    }

    fn legitimate(&mut self) -> FeatureRow {
        let mut row = FeatureRow::new();
        row.insert("amount".into(), self.rng.gen_range(10.0..500.0) * self.amount_scale);
        row.insert("tx_count_last_hour".into(), self.rng.gen_range(0..3) as f64);
        row.insert("failed_tx_last_hour".into(), 0.0);
        row.insert("hour_of_day".into(), self.rng.gen_range(7..23) as f64);
        row.insert("account_age_days".into(), self.rng.gen_range(30..1000) as f64);
        // location is sometimes unknown
        if self.rng.gen_bool(0.98) {
            row.insert("distance_from_last_tx".into(), self.rng.gen_range(0.0..100.0));
        }
        row
    }

    fn suspicious(&mut self) -> FeatureRow {
        let mut row = FeatureRow::new();
        row.insert("amount".into(), self.rng.gen_range(1000.0..10000.0) * self.amount_scale);
        row.insert("tx_count_last_hour".into(), self.rng.gen_range(5..15) as f64);
        row.insert("failed_tx_last_hour".into(), self.rng.gen_range(1..5) as f64);
        row.insert("hour_of_day".into(), self.rng.gen_range(0..6) as f64);
        row.insert("account_age_days".into(), self.rng.gen_range(1..30) as f64);
        row.insert("distance_from_last_tx".into(), self.rng.gen_range(500.0..5000.0));
        row
    }

    fn window(&mut self, rows: usize, fraud_rate: f64) -> Vec<FeatureRow> {
        (0..rows)
            .map(|_| {
                if self.rng.gen_bool(fraud_rate) {
                    self.suspicious()
                } else {
                    self.legitimate()
                }
            })
            .collect()
    }
}

fn demo_model() -> LogisticModel {
    LogisticModel::new(-6.0, "1.0.0")
        .with_weight("amount", 0.0006)
        .with_weight("tx_count_last_hour", 0.35)
        .with_weight("failed_tx_last_hour", 0.8)
        .with_weight("account_age_days", -0.002)
        .with_weight("distance_from_last_tx", 0.0008)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("snapshot_generator=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let out_dir = PathBuf::from(args.get(1).map(|s| s.as_str()).unwrap_or("data/monitoring"));
    let rows: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(1000);
    let reference_fraud_rate: f64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(0.02);
    let current_fraud_rate: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.05);
    let amount_shift: f64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(1.5);

    anyhow::ensure!(
        (0.0..=1.0).contains(&reference_fraud_rate) && (0.0..=1.0).contains(&current_fraud_rate),
        "fraud rates must be within [0, 1]"
    );

    info!(
        out_dir = %out_dir.display(),
        rows,
        reference_fraud_rate,
        current_fraud_rate,
        amount_shift,
        "Generating snapshots"
    );

    let model = demo_model();

    let reference_rows = RowGenerator::new(1.0).window(rows, reference_fraud_rate);
    let reference = capture_snapshot(&model, &reference_rows)?;
    reference.save(out_dir.join("reference.json"))?;

    let current_rows = RowGenerator::new(amount_shift).window(rows, current_fraud_rate);
    let current = capture_snapshot(&model, &current_rows)?;
    current.save(out_dir.join("current.json"))?;

    let flagged = |scores: &[f64]| scores.iter().filter(|&&s| s > 0.5).count();
    info!(
        reference_flagged = flagged(&reference.prediction_scores),
        current_flagged = flagged(&current.prediction_scores),
        "Snapshots written"
    );

    Ok(())
}
