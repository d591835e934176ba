//! Type definitions shared across the monitoring core

pub mod alert;
pub mod drift;
pub mod frame;

pub use alert::{AlertChannel, AlertPayload, AlertSeverity};
pub use drift::{DriftFinding, DriftReport, DriftSeverity, FeatureDrift, TargetDriftFinding};
pub use frame::{FeatureFrame, FeatureRow};
