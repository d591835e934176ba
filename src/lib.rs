//! Fraud Model Monitor Library
//!
//! Drift detection, alerting and request authentication for a deployed
//! fraud-scoring model.

pub mod alerts;
pub mod auth;
pub mod config;
pub mod drift;
pub mod metrics;
pub mod models;
pub mod monitor;
pub mod types;

pub use alerts::{AlertManager, AlertPolicy};
pub use auth::{AuthError, AuthorizationGate, TokenSigner};
pub use config::AppConfig;
pub use drift::{FraudDriftDetector, WindowSnapshot};
pub use monitor::{MonitoringJob, MonitoringRun};
pub use types::{alert::AlertPayload, drift::DriftReport};
