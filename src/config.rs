//! Configuration management for the fraud monitoring core
//!
//! Everything tunable lives in one [`AppConfig`] built at startup and passed
//! into component constructors. Nothing reads process state afterwards.

use crate::types::drift::SeverityThresholds;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "config/monitor.toml";

/// Prefix for environment overrides, e.g. `FRAUD_MONITOR__AUTH__SECRET_KEY`
pub const ENV_PREFIX: &str = "FRAUD_MONITOR";

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub auth: AuthConfig,
    pub drift: DriftConfig,
    pub serving: ServingConfig,
    pub alerts: AlertsConfig,
    pub monitoring: MonitoringConfig,
    pub logging: LoggingConfig,
}

/// Token signing and API key configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for bearer tokens
    pub secret_key: String,
    /// Default token lifetime in minutes
    pub token_ttl_minutes: i64,
    /// Whether the static API key is accepted at all
    pub api_key_enabled: bool,
    /// The accepted API key, if any
    pub api_key: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: "change-me-in-production".to_string(),
            token_ttl_minutes: 30,
            api_key_enabled: false,
            api_key: None,
        }
    }
}

/// Drift detection thresholds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DriftConfig {
    /// PSI above which a feature is flagged
    pub psi_threshold: f64,
    /// KS p-value below which a feature is flagged
    pub ks_threshold: f64,
    /// Number of quantile bins for PSI
    pub psi_bins: usize,
    /// Floor applied to empty PSI bins
    pub psi_epsilon: f64,
    /// Severity boundaries on PSI
    pub severity: SeverityThresholds,
    /// Relative fraud-rate change that flags target drift
    pub rate_change_threshold: f64,
    /// Score boundary used to count fraud in target drift
    pub decision_boundary: f64,
    /// Features to monitor; empty means every feature of the reference
    pub features: Vec<String>,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            psi_threshold: 0.2,
            ks_threshold: 0.05,
            psi_bins: 10,
            psi_epsilon: 0.0001,
            severity: SeverityThresholds::default(),
            rate_change_threshold: 0.3,
            decision_boundary: 0.5,
            features: Vec::new(),
        }
    }
}

/// Settings mirrored from the serving layer
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServingConfig {
    /// Name reported in alert metadata
    pub model_name: String,
    /// Deployed model version
    pub model_version: String,
    /// Operating threshold the serving layer flags fraud at (score >= threshold)
    pub operating_threshold: Option<f64>,
}

impl Default for ServingConfig {
    fn default() -> Self {
        Self {
            model_name: "fraud-detection-model".to_string(),
            model_version: "1.0.0".to_string(),
            operating_threshold: Some(0.5),
        }
    }
}

/// One webhook-style notification channel
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub enabled: bool,
    pub url: Option<String>,
}

impl ChannelConfig {
    /// Enabled and pointing somewhere
    pub fn is_active(&self) -> bool {
        self.enabled && self.url.as_deref().is_some_and(|u| !u.is_empty())
    }
}

/// Alerting configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    /// Per-channel delivery timeout
    pub timeout_secs: u64,
    /// Drift score from which a drift alert is critical
    pub drift_critical_score: f64,
    /// Fraud-rate increase (percent) from which a spike alert is critical
    pub spike_critical_pct: f64,
    pub slack: ChannelConfig,
    /// Slack channel name put in the message body
    pub slack_channel: String,
    pub teams: ChannelConfig,
    /// Email has no bundled sink; a sink must be registered by the caller
    pub email_enabled: bool,
    pub webhook: ChannelConfig,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            drift_critical_score: 0.3,
            spike_critical_pct: 50.0,
            slack: ChannelConfig::default(),
            slack_channel: "#fraud-detection-alerts".to_string(),
            teams: ChannelConfig::default(),
            email_enabled: false,
            webhook: ChannelConfig::default(),
        }
    }
}

/// Periodic monitoring job configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// Reference snapshot captured at deployment
    pub reference_path: PathBuf,
    /// Current window snapshot, refreshed by the capture side
    pub current_path: PathBuf,
    /// Where each run's JSON report is written
    pub report_path: PathBuf,
    /// Seconds between runs; 0 runs once and exits
    pub interval_secs: u64,
    /// Expected fraud rate for spike alerts; defaults to the reference rate
    pub expected_fraud_rate: Option<f64>,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            reference_path: PathBuf::from("data/monitoring/reference.json"),
            current_path: PathBuf::from("data/monitoring/current.json"),
            report_path: PathBuf::from("reports/monitoring/drift_report.json"),
            interval_secs: 3600,
            expected_fraud_rate: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file plus environment overrides
    pub fn load() -> Result<Self> {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific path plus environment overrides.
    ///
    /// A missing file is not an error; defaults and environment apply.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.auth.secret_key.is_empty() {
            anyhow::bail!("auth.secret_key must not be empty");
        }
        if self.auth.token_ttl_minutes < 0 {
            anyhow::bail!("auth.token_ttl_minutes must not be negative");
        }
        if self.drift.psi_bins == 0 {
            anyhow::bail!("drift.psi_bins must be at least 1");
        }
        if self.drift.psi_epsilon.is_nan() || self.drift.psi_epsilon <= 0.0 {
            anyhow::bail!("drift.psi_epsilon must be positive");
        }
        if self.drift.severity.moderate > self.drift.severity.significant {
            anyhow::bail!("drift.severity.moderate must not exceed drift.severity.significant");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.auth.token_ttl_minutes, 30);
        assert!(!config.auth.api_key_enabled);
        assert_eq!(config.drift.psi_threshold, 0.2);
        assert_eq!(config.drift.ks_threshold, 0.05);
        assert_eq!(config.drift.psi_bins, 10);
        assert_eq!(config.drift.psi_epsilon, 0.0001);
        assert_eq!(config.drift.decision_boundary, 0.5);
        assert_eq!(config.alerts.timeout_secs, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[auth]
secret_key = "s3cret"
api_key_enabled = true
api_key = "k-123"

[drift]
psi_threshold = 0.25
features = ["amount", "age"]

[alerts.slack]
enabled = true
url = "https://hooks.example.com/x"
"#
        )
        .unwrap();

        let config = AppConfig::load_from_path(file.path()).unwrap();

        assert_eq!(config.auth.secret_key, "s3cret");
        assert_eq!(config.auth.api_key.as_deref(), Some("k-123"));
        assert_eq!(config.drift.psi_threshold, 0.25);
        // untouched keys keep their defaults
        assert_eq!(config.drift.ks_threshold, 0.05);
        assert_eq!(config.drift.features, vec!["amount", "age"]);
        assert!(config.alerts.slack.is_active());
        assert!(!config.alerts.teams.is_active());
    }

    #[test]
    fn test_validate_rejects_zero_bins() {
        let mut config = AppConfig::default();
        config.drift.psi_bins = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_channel_without_url_is_inactive() {
        let channel = ChannelConfig {
            enabled: true,
            url: None,
        };
        assert!(!channel.is_active());
    }
}
