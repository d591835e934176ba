//! Fraud Model Monitor - Main Entry Point
//!
//! Periodically compares the current scoring window against the frozen
//! reference snapshot, writes a drift report and fans alerts out to the
//! configured channels.

use anyhow::Result;
use fraud_monitor::{
    config::{AppConfig, LoggingConfig},
    metrics::{MetricsReporter, MonitoringMetrics},
    monitor::MonitoringJob,
    WindowSnapshot,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("fraud_monitor={}", logging.level)))?;

    if logging.format == "json" {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

/// Load the current window and run the job once
async fn run_once(job: &MonitoringJob, current_path: &Path, metrics: &MonitoringMetrics) {
    let current = match WindowSnapshot::load(current_path) {
        Ok(current) => current,
        Err(e) => {
            error!(path = %current_path.display(), error = %e, "Failed to load current window");
            metrics.record_failed_run();
            return;
        }
    };

    if let Err(e) = job.run(&current).await {
        error!(error = %e, "Monitoring run failed");
        metrics.record_failed_run();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration first: it decides the log format
    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    init_logging(&config.logging)?;

    info!("Starting Fraud Model Monitor");
    info!(
        psi_threshold = config.drift.psi_threshold,
        ks_threshold = config.drift.ks_threshold,
        psi_bins = config.drift.psi_bins,
        model = %config.serving.model_name,
        "Configuration loaded"
    );

    let reference = WindowSnapshot::load(&config.monitoring.reference_path)?;
    let metrics = Arc::new(MonitoringMetrics::new());
    let job = MonitoringJob::from_config(&config, reference).with_metrics(metrics.clone());
    let current_path = config.monitoring.current_path.clone();

    if config.monitoring.interval_secs == 0 {
        run_once(&job, &current_path, &metrics).await;
        metrics.print_summary();
        return Ok(());
    }

    let reporter = MetricsReporter::new(metrics.clone(), config.monitoring.interval_secs * 4);
    tokio::spawn(reporter.start());

    info!(
        interval_secs = config.monitoring.interval_secs,
        current_path = %current_path.display(),
        "Entering monitoring loop"
    );
    let mut interval = tokio::time::interval(Duration::from_secs(config.monitoring.interval_secs));

    loop {
        tokio::select! {
            _ = interval.tick() => run_once(&job, &current_path, &metrics).await,
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    info!("Monitor shutting down...");
    metrics.print_summary();

    Ok(())
}
