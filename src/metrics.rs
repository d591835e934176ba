//! Run statistics for the monitoring daemon.

use crate::alerts::DispatchReport;
use crate::types::alert::AlertSeverity;
use crate::types::drift::DriftReport;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Counters and distributions accumulated across monitoring runs
pub struct MonitoringMetrics {
    /// Completed monitoring runs
    pub runs_completed: AtomicU64,
    /// Runs that failed before producing a report
    pub runs_failed: AtomicU64,
    /// Feature comparisons attempted
    pub features_checked: AtomicU64,
    /// Feature comparisons that detected drift
    pub features_drifted: AtomicU64,
    /// Feature comparisons that could not be computed
    pub features_unavailable: AtomicU64,
    alerts_by_severity: RwLock<BTreeMap<AlertSeverity, u64>>,
    deliveries: RwLock<BTreeMap<String, DeliveryStats>>,
    /// Run durations in milliseconds
    run_times: RwLock<Vec<u64>>,
    /// Current-window fraud scores in ten buckets
    score_buckets: RwLock<[u64; 10]>,
    start_time: Instant,
}

impl MonitoringMetrics {
    pub fn new() -> Self {
        Self {
            runs_completed: AtomicU64::new(0),
            runs_failed: AtomicU64::new(0),
            features_checked: AtomicU64::new(0),
            features_drifted: AtomicU64::new(0),
            features_unavailable: AtomicU64::new(0),
            alerts_by_severity: RwLock::new(BTreeMap::new()),
            deliveries: RwLock::new(BTreeMap::new()),
            run_times: RwLock::new(Vec::with_capacity(64)),
            score_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a finished run and its drift report
    pub fn record_run(&self, duration: Duration, report: &DriftReport) {
        self.runs_completed.fetch_add(1, Ordering::Relaxed);
        self.features_checked
            .fetch_add(report.len() as u64, Ordering::Relaxed);
        self.features_drifted
            .fetch_add(report.drifted().len() as u64, Ordering::Relaxed);
        self.features_unavailable
            .fetch_add(report.unavailable().len() as u64, Ordering::Relaxed);

        if let Ok(mut times) = self.run_times.write() {
            times.push(duration.as_millis() as u64);
            if times.len() > 1000 {
                times.drain(0..500);
            }
        }
    }

    pub fn record_failed_run(&self) {
        self.runs_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Bucket the fraud scores of a current window
    pub fn record_scores(&self, scores: &[f64]) {
        if let Ok(mut buckets) = self.score_buckets.write() {
            for score in scores.iter().filter(|s| s.is_finite()) {
                let bucket = (score.clamp(0.0, 1.0) * 10.0).min(9.0) as usize;
                buckets[bucket] += 1;
            }
        }
    }

    pub fn record_alert(&self, severity: AlertSeverity) {
        if let Ok(mut by_severity) = self.alerts_by_severity.write() {
            *by_severity.entry(severity).or_insert(0) += 1;
        }
    }

    /// Record per-channel delivery outcomes of one dispatch
    pub fn record_dispatch(&self, report: &DispatchReport) {
        if let Ok(mut deliveries) = self.deliveries.write() {
            for (channel, delivered) in report.as_bool_map() {
                let stats = deliveries.entry(channel).or_default();
                if delivered {
                    stats.delivered += 1;
                } else {
                    stats.failed += 1;
                }
            }
        }
    }

    pub fn get_run_stats(&self) -> RunStats {
        let mut sorted = match self.run_times.read() {
            Ok(times) if !times.is_empty() => times.clone(),
            _ => return RunStats::default(),
        };
        sorted.sort_unstable();

        let count = sorted.len();
        RunStats {
            count: count as u64,
            mean_ms: sorted.iter().sum::<u64>() / count as u64,
            p50_ms: sorted[count / 2],
            max_ms: sorted[count - 1],
        }
    }

    pub fn get_alerts_by_severity(&self) -> BTreeMap<AlertSeverity, u64> {
        self.alerts_by_severity
            .read()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    pub fn get_delivery_stats(&self) -> BTreeMap<String, DeliveryStats> {
        self.deliveries.read().map(|m| m.clone()).unwrap_or_default()
    }

    pub fn get_score_distribution(&self) -> [u64; 10] {
        self.score_buckets.read().map(|b| *b).unwrap_or([0; 10])
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Log a summary table
    pub fn print_summary(&self) {
        let runs = self.runs_completed.load(Ordering::Relaxed);
        let failed = self.runs_failed.load(Ordering::Relaxed);
        let checked = self.features_checked.load(Ordering::Relaxed);
        let drifted = self.features_drifted.load(Ordering::Relaxed);
        let unavailable = self.features_unavailable.load(Ordering::Relaxed);
        let drift_rate = if checked > 0 {
            drifted as f64 / checked as f64 * 100.0
        } else {
            0.0
        };
        let timing = self.get_run_stats();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║             FRAUD MODEL MONITOR - METRICS SUMMARY            ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Runs Completed: {:>6}  │  Failed: {:>6}  │  Uptime: {:>6}s ║",
            runs,
            failed,
            self.uptime().as_secs()
        );
        info!(
            "║ Features Checked: {:>6}  │  Drifted: {:>6} ({:>5.1}%)        ║",
            checked, drifted, drift_rate
        );
        info!("║ Features Unavailable: {:>6}                                 ║", unavailable);
        info!(
            "║ Run Time (ms): mean={:>6} p50={:>6} max={:>6}               ║",
            timing.mean_ms, timing.p50_ms, timing.max_ms
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Alerts by Severity:                                          ║");
        for (severity, count) in self.get_alerts_by_severity() {
            info!("║   {:10}: {:>6}                                         ║", severity, count);
        }
        info!("║ Deliveries by Channel:                                       ║");
        for (channel, stats) in self.get_delivery_stats() {
            info!(
                "║   {:10}: delivered={:>5} failed={:>5}                     ║",
                channel, stats.delivered, stats.failed
            );
        }
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Current Fraud Score Distribution:                            ║");
        let scores = self.get_score_distribution();
        let total: u64 = scores.iter().sum();
        for (i, &count) in scores.iter().enumerate() {
            let pct = if total > 0 { count as f64 / total as f64 * 100.0 } else { 0.0 };
            let bar = "█".repeat(((pct / 2.0) as usize).min(20));
            info!(
                "║   {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                bar
            );
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for MonitoringMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Run duration statistics
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunStats {
    pub count: u64,
    pub mean_ms: u64,
    pub p50_ms: u64,
    pub max_ms: u64,
}

/// Delivery counters for one channel
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryStats {
    pub delivered: u64,
    pub failed: u64,
}

/// Prints the metrics summary on a fixed interval
pub struct MetricsReporter {
    metrics: Arc<MonitoringMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<MonitoringMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs: interval_secs.max(1),
        }
    }

    /// Run forever, printing a summary every interval
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        // the first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::DeliveryOutcome;
    use crate::types::alert::AlertChannel;
    use crate::types::drift::{DriftFinding, DriftSeverity, FeatureDrift};

    fn report() -> DriftReport {
        let finding = |psi: f64, drift: bool| {
            FeatureDrift::Computed(DriftFinding {
                psi,
                ks_statistic: 0.0,
                ks_p_value: 1.0,
                drift_detected: drift,
                drift_severity: DriftSeverity::None,
            })
        };
        let mut report = DriftReport::new();
        report.features.insert("a".into(), finding(0.5, true));
        report.features.insert("b".into(), finding(0.0, false));
        report.features.insert(
            "c".into(),
            FeatureDrift::Unavailable {
                unavailable: "empty".into(),
            },
        );
        report
    }

    #[test]
    fn test_run_recording() {
        let metrics = MonitoringMetrics::new();
        metrics.record_run(Duration::from_millis(100), &report());
        metrics.record_run(Duration::from_millis(300), &report());

        assert_eq!(metrics.runs_completed.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.features_checked.load(Ordering::Relaxed), 6);
        assert_eq!(metrics.features_drifted.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.features_unavailable.load(Ordering::Relaxed), 2);

        let stats = metrics.get_run_stats();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.mean_ms, 200);
        assert_eq!(stats.max_ms, 300);
    }

    #[test]
    fn test_score_buckets() {
        let metrics = MonitoringMetrics::new();
        metrics.record_scores(&[0.0, 0.05, 0.55, 1.0, f64::NAN]);

        let dist = metrics.get_score_distribution();
        assert_eq!(dist[0], 2);
        assert_eq!(dist[5], 1);
        assert_eq!(dist[9], 1);
        assert_eq!(dist.iter().sum::<u64>(), 4);
    }

    #[test]
    fn test_alert_and_delivery_counts() {
        let metrics = MonitoringMetrics::new();
        metrics.record_alert(AlertSeverity::Critical);
        metrics.record_alert(AlertSeverity::Critical);
        metrics.record_alert(AlertSeverity::Warning);

        let mut dispatch = DispatchReport::default();
        dispatch.outcomes.insert(AlertChannel::Slack, DeliveryOutcome::Delivered);
        dispatch.outcomes.insert(
            AlertChannel::Webhook,
            DeliveryOutcome::Failed { reason: "timeout".into() },
        );
        metrics.record_dispatch(&dispatch);
        metrics.record_dispatch(&dispatch);

        assert_eq!(metrics.get_alerts_by_severity()[&AlertSeverity::Critical], 2);
        let deliveries = metrics.get_delivery_stats();
        assert_eq!(deliveries["slack"].delivered, 2);
        assert_eq!(deliveries["webhook"].failed, 2);
    }
}
