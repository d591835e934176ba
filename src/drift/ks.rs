//! Two-sample Kolmogorov-Smirnov test

use super::{check_sample, DriftError};
use serde::{Deserialize, Serialize};

/// KS statistic with its asymptotic p-value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KsResult {
    pub statistic: f64,
    pub p_value: f64,
}

/// Largest absolute distance between the two empirical CDFs
pub fn ks_statistic(a: &[f64], b: &[f64]) -> f64 {
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_by(f64::total_cmp);
    b.sort_by(f64::total_cmp);

    let (n, m) = (a.len() as f64, b.len() as f64);
    let (mut i, mut j) = (0usize, 0usize);
    let mut d: f64 = 0.0;

    while i < a.len() && j < b.len() {
        let v = a[i].min(b[j]);
        while i < a.len() && a[i] <= v {
            i += 1;
        }
        while j < b.len() && b[j] <= v {
            j += 1;
        }
        d = d.max((i as f64 / n - j as f64 / m).abs());
    }

    d
}

/// Survival function of the Kolmogorov distribution, `P(K > lambda)`.
///
/// Alternating series `2 * sum((-1)^(k-1) * exp(-2 k^2 lambda^2))`; when it
/// fails to converge (small lambda) the probability is 1.
pub fn kolmogorov_survival(lambda: f64) -> f64 {
    const EPS_TERM: f64 = 0.001;
    const EPS_SUM: f64 = 1.0e-8;

    if lambda <= 0.0 {
        return 1.0;
    }

    let a2 = -2.0 * lambda * lambda;
    let mut fac = 2.0;
    let mut sum = 0.0;
    let mut previous = 0.0;

    for k in 1..=100 {
        let kf = k as f64;
        let term = fac * (a2 * kf * kf).exp();
        sum += term;
        if term.abs() <= EPS_TERM * previous || term.abs() <= EPS_SUM * sum {
            return sum.clamp(0.0, 1.0);
        }
        fac = -fac;
        previous = term.abs();
    }

    1.0
}

/// Two-sample KS test with the asymptotic p-value.
///
/// Uses the effective size `n*m/(n+m)` and the small-sample correction
/// `(sqrt(en) + 0.12 + 0.11/sqrt(en)) * D`. There is no exact small-sample
/// distribution, so p-values for small windows are approximate.
pub fn ks_two_sample(reference: &[f64], current: &[f64]) -> Result<KsResult, DriftError> {
    check_sample(reference, "reference")?;
    check_sample(current, "current")?;

    let statistic = ks_statistic(reference, current);

    let (n, m) = (reference.len() as f64, current.len() as f64);
    let en = (n * m / (n + m)).sqrt();
    let lambda = (en + 0.12 + 0.11 / en) * statistic;

    Ok(KsResult {
        statistic,
        p_value: kolmogorov_survival(lambda),
    })
}
