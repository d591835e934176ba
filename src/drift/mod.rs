//! Statistical drift detection: PSI, KS and chi-square against a frozen
//! reference window.

pub mod chi_square;
pub mod detector;
pub mod ks;
pub mod psi;
pub mod reference;

pub use detector::FraudDriftDetector;
pub use reference::{ReferenceDistribution, WindowSnapshot};

/// Failures of a single statistic computation.
///
/// These stay local to one feature; the detector records them as
/// unavailable entries instead of aborting a run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DriftError {
    #[error("{side} sample is empty")]
    EmptySample { side: &'static str },

    #[error("{side} sample contains a non-finite value")]
    NonFiniteValue { side: &'static str },

    #[error("bin count must be at least 1, got {0}")]
    InvalidBins(usize),

    #[error("chi-square needs at least two matching categories, got {0}")]
    TooFewCategories(usize),

    #[error("distribution error: {0}")]
    Distribution(String),
}

pub(crate) fn check_sample(values: &[f64], side: &'static str) -> Result<(), DriftError> {
    if values.is_empty() {
        return Err(DriftError::EmptySample { side });
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(DriftError::NonFiniteValue { side });
    }
    Ok(())
}
