//! Chi-square goodness-of-fit over category frequencies

use super::DriftError;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChiSquareResult {
    pub statistic: f64,
    pub p_value: f64,
}

/// Goodness-of-fit of `observed` against `expected` with `k - 1` degrees of
/// freedom.
///
/// A category with zero expected frequency contributes nothing when its
/// observed frequency is also zero; otherwise the statistic is infinite and
/// the p-value 0.
pub fn chi_square(observed: &[f64], expected: &[f64]) -> Result<ChiSquareResult, DriftError> {
    if observed.len() != expected.len() || observed.len() < 2 {
        return Err(DriftError::TooFewCategories(observed.len().min(expected.len())));
    }

    let mut statistic = 0.0;
    for (&o, &e) in observed.iter().zip(expected) {
        if e == 0.0 {
            if o != 0.0 {
                statistic = f64::INFINITY;
            }
            continue;
        }
        statistic += (o - e).powi(2) / e;
    }

    if statistic.is_infinite() {
        return Ok(ChiSquareResult {
            statistic,
            p_value: 0.0,
        });
    }

    let dof = (observed.len() - 1) as f64;
    let dist = ChiSquared::new(dof).map_err(|e| DriftError::Distribution(format!("{:?}", e)))?;

    Ok(ChiSquareResult {
        statistic,
        p_value: dist.sf(statistic).clamp(0.0, 1.0),
    })
}

/// Chi-square over the two-category fraud / not-fraud rate vectors
pub fn rate_chi_square(current_rate: f64, reference_rate: f64) -> Result<ChiSquareResult, DriftError> {
    chi_square(
        &[current_rate, 1.0 - current_rate],
        &[reference_rate, 1.0 - reference_rate],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_rates() {
        let result = rate_chi_square(0.1, 0.1).unwrap();
        assert_eq!(result.statistic, 0.0);
        assert!((result.p_value - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_known_statistic() {
        // (0.2-0.1)^2/0.1 + (0.8-0.9)^2/0.9 = 0.1 + 0.0111...
        let result = rate_chi_square(0.2, 0.1).unwrap();
        assert!((result.statistic - (0.1 + 0.01 / 0.9)).abs() < 1e-12);
        assert!(result.p_value > 0.5 && result.p_value < 1.0);
    }

    #[test]
    fn test_zero_expected_category() {
        let unchanged = rate_chi_square(0.0, 0.0).unwrap();
        assert_eq!(unchanged.statistic, 0.0);

        let appeared = rate_chi_square(0.05, 0.0).unwrap();
        assert!(appeared.statistic.is_infinite());
        assert_eq!(appeared.p_value, 0.0);
    }

    #[test]
    fn test_needs_two_categories() {
        assert_eq!(chi_square(&[1.0], &[1.0]), Err(DriftError::TooFewCategories(1)));
    }
}
