//! Population Stability Index over reference-quantile bins

use super::{check_sample, DriftError};

/// Linearly interpolated percentile of an ascending sample, `q` in [0, 100]
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    let last = sorted.len() - 1;
    let pos = (q / 100.0) * last as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + frac * (sorted[hi] - sorted[lo])
    }
}

/// `bins + 1` bin edges at evenly spaced reference percentiles, with the
/// outer edges opened to -inf/+inf so every value lands in some bin.
pub fn breakpoints(reference: &[f64], bins: usize) -> Result<Vec<f64>, DriftError> {
    if bins == 0 {
        return Err(DriftError::InvalidBins(bins));
    }
    check_sample(reference, "reference")?;

    let mut sorted = reference.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mut edges: Vec<f64> = (0..=bins)
        .map(|i| percentile(&sorted, 100.0 * i as f64 / bins as f64))
        .collect();
    edges[0] = f64::NEG_INFINITY;
    edges[bins] = f64::INFINITY;
    Ok(edges)
}

/// Index of the bin holding `value`: the last bin whose lower edge is <= value.
///
/// Repeated edges produce empty bins, same as a histogram over those edges.
fn bin_index(edges: &[f64], value: f64) -> usize {
    let bins = edges.len() - 1;
    let at_or_below = edges.partition_point(|&e| e <= value);
    at_or_below.saturating_sub(1).min(bins - 1)
}

/// Per-bin fractions of `values`, with empty bins floored to `epsilon`
pub fn bin_fractions(values: &[f64], edges: &[f64], epsilon: f64) -> Vec<f64> {
    let bins = edges.len() - 1;
    let mut counts = vec![0usize; bins];
    for &v in values {
        counts[bin_index(edges, v)] += 1;
    }

    let total = values.len() as f64;
    counts
        .into_iter()
        .map(|c| {
            let fraction = c as f64 / total;
            if fraction == 0.0 {
                epsilon
            } else {
                fraction
            }
        })
        .collect()
}

/// Population Stability Index of `current` against `reference`.
///
/// `PSI = sum((cur - ref) * ln(cur / ref))` over reference-quantile bins.
/// Each term is non-negative, so PSI >= 0, and identical binned
/// distributions give exactly 0.
pub fn psi(reference: &[f64], current: &[f64], bins: usize, epsilon: f64) -> Result<f64, DriftError> {
    check_sample(current, "current")?;
    let edges = breakpoints(reference, bins)?;

    let ref_fractions = bin_fractions(reference, &edges, epsilon);
    let cur_fractions = bin_fractions(current, &edges, epsilon);

    let psi = ref_fractions
        .iter()
        .zip(&cur_fractions)
        .map(|(&r, &c)| (c - r) * (c / r).ln())
        .sum::<f64>();

    Ok(psi)
}
