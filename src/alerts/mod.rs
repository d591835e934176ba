//! Alert construction and delivery

pub mod manager;
pub mod rules;
pub mod sink;

pub use manager::{AlertManager, DeliveryOutcome, DispatchReport};
pub use rules::{drift_alert, fraud_spike_alert, AlertPolicy};
pub use sink::{DeliveryError, HttpSink, NotificationSink, UnconfiguredSink};
