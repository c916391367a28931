//! ## Numeric summaries computed over collected columns
//!
//! - [`quantile`]: exact quantile with linear interpolation between the closest ranks.
//! - [`histogram`]: equal-width bins spanning the observed range.
//! - [`gaussian_kde`]: Gaussian kernel density estimate with Scott's rule bandwidth.
//!
//! Missing values (`NaN`) are ignored by every function here.

use crate::exceptions::{TripInsightsError, TripInsightsResult};
use rayon::prelude::*;

/// Sorted copy of the non-NaN values.
fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Returns the `q` quantile of `values`, interpolating linearly between the two
/// closest ranks. For values `[1, 1, 1, 1, 100]` the 0.95 quantile is `80.2`.
///
/// Returns `Ok(None)` when there are no values.
pub fn quantile(values: &[f64], q: f64) -> TripInsightsResult<Option<f64>> {
    if !(0.0..=1.0).contains(&q) {
        return Err(TripInsightsError::InvalidParameter(format!(
            "Quantile {} must be between 0 and 1",
            q
        )));
    }
    let sorted = sorted_finite(values);
    if sorted.is_empty() {
        return Ok(None);
    }
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Ok(Some(
        sorted[lower] + (sorted[upper] - sorted[lower]) * fraction,
    ))
}

/// Equal-width histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBins {
    /// `bins + 1` increasing bin edges. The last bin is closed on the right.
    pub edges: Vec<f64>,
    /// Number of values per bin.
    pub counts: Vec<u64>,
}

impl HistogramBins {
    /// Width shared by all bins, or `None` for an empty histogram.
    pub fn bin_width(&self) -> Option<f64> {
        match (self.edges.first(), self.edges.get(1)) {
            (Some(first), Some(second)) => Some(second - first),
            _ => None,
        }
    }
}

/// Splits the range of `values` into `bins` equal-width bins and counts the values per bin.
///
/// A constant column gets the range `[v - 0.5, v + 0.5]`; an empty one yields no bins.
pub fn histogram(values: &[f64], bins: usize) -> TripInsightsResult<HistogramBins> {
    if bins < 1 {
        return Err(TripInsightsError::InvalidParameter(
            "Number of bins must be at least 1".to_string(),
        ));
    }
    let sorted = sorted_finite(values);
    let (Some(&first), Some(&last)) = (sorted.first(), sorted.last()) else {
        return Ok(HistogramBins {
            edges: Vec::new(),
            counts: Vec::new(),
        });
    };
    let (min_val, max_val) = if first == last {
        (first - 0.5, last + 0.5)
    } else {
        (first, last)
    };
    let width = (max_val - min_val) / bins as f64;
    let edges: Vec<f64> = (0..=bins)
        .map(|i| {
            if i == bins {
                max_val
            } else {
                min_val + i as f64 * width
            }
        })
        .collect();
    let mut counts = vec![0u64; bins];
    for value in sorted {
        let index = (((value - min_val) / width).floor() as usize).min(bins - 1);
        counts[index] += 1;
    }
    Ok(HistogramBins { edges, counts })
}

/// Evaluates a Gaussian kernel density estimate of `values` at `points` evenly spaced
/// positions between the smallest and largest value.
///
/// The bandwidth follows Scott's rule: `std * n^(-1/5)` with the sample standard deviation.
/// Returns `(x, density)` pairs; empty when fewer than two values are present or all
/// values are equal, since no bandwidth can be estimated then.
pub fn gaussian_kde(values: &[f64], points: usize) -> Vec<(f64, f64)> {
    let sorted = sorted_finite(values);
    let n = sorted.len();
    if n < 2 || points == 0 {
        return Vec::new();
    }
    let mean = sorted.iter().sum::<f64>() / n as f64;
    let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let bandwidth = variance.sqrt() * (n as f64).powf(-0.2);
    if bandwidth <= 0.0 || !bandwidth.is_finite() {
        return Vec::new();
    }

    let min_val = sorted[0];
    let max_val = sorted[n - 1];
    let step = if points > 1 {
        (max_val - min_val) / (points - 1) as f64
    } else {
        0.0
    };
    let norm = 1.0 / (n as f64 * bandwidth * (2.0 * std::f64::consts::PI).sqrt());

    (0..points)
        .into_par_iter()
        .map(|i| {
            let x = min_val + i as f64 * step;
            let density = sorted
                .iter()
                .map(|v| {
                    let z = (x - v) / bandwidth;
                    (-0.5 * z * z).exp()
                })
                .sum::<f64>()
                * norm;
            (x, density)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_quantile_interpolates_between_ranks() {
        let q = quantile(&[1.0, 1.0, 1.0, 1.0, 100.0], 0.95).unwrap().unwrap();
        assert_abs_diff_eq!(q, 80.2, epsilon = 1e-9);
        let median = quantile(&[4.0, 1.0, 3.0, 2.0], 0.5).unwrap().unwrap();
        assert_abs_diff_eq!(median, 2.5, epsilon = 1e-9);
    }

    #[test]
    fn test_quantile_ignores_nan_and_handles_empty() {
        let q = quantile(&[f64::NAN, 5.0], 1.0).unwrap();
        assert_eq!(q, Some(5.0));
        assert_eq!(quantile(&[], 0.5).unwrap(), None);
        assert!(quantile(&[1.0], 1.5).is_err());
    }

    #[test]
    fn test_histogram_counts_every_value_once() {
        let values: Vec<f64> = (0..=10).map(f64::from).collect();
        let hist = histogram(&values, 5).unwrap();
        assert_eq!(hist.edges.len(), 6);
        assert_eq!(hist.counts, vec![2, 2, 2, 2, 3]);
        assert_abs_diff_eq!(hist.bin_width().unwrap(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_histogram_constant_and_empty() {
        let hist = histogram(&[3.0, 3.0], 2).unwrap();
        assert_eq!(hist.edges, vec![2.5, 3.0, 3.5]);
        assert_eq!(hist.counts, vec![0, 2]);
        let empty = histogram(&[], 30).unwrap();
        assert!(empty.counts.is_empty());
        assert!(histogram(&[1.0], 0).is_err());
    }

    #[test]
    fn test_kde_integrates_to_roughly_one() {
        let values: Vec<f64> = (0..200).map(|i| (i % 20) as f64).collect();
        let curve = gaussian_kde(&values, 200);
        assert_eq!(curve.len(), 200);
        let step = curve[1].0 - curve[0].0;
        let area: f64 = curve.iter().map(|(_, d)| d * step).sum();
        // The grid stops at the data range, so a little mass falls outside.
        assert!(area > 0.8 && area <= 1.0, "area was {}", area);
        assert!(gaussian_kde(&[2.0, 2.0], 10).is_empty());
    }
}
