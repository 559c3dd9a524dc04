//! Summary statistics over bands with missing samples.
//!
//! Every statistic is computed from the sorted valid samples, so results do not depend on the
//! order the pixels were visited in.

use ndarray::ArrayBase;
use ndarray::Data;
use ndarray::Dimension;

/// Seven-number summary of the non-NaN samples of a band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandSummary {
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub p25: f64,
    pub p75: f64,
}

impl BandSummary {
    pub const NAMES: [&'static str; 7] = ["mean", "median", "std", "min", "max", "p25", "p75"];

    pub fn missing() -> Self {
        Self {
            mean: f64::NAN,
            median: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
            p25: f64::NAN,
            p75: f64::NAN,
        }
    }

    /// Values in the order of [`BandSummary::NAMES`].
    pub fn values(&self) -> [f64; 7] {
        [
            self.mean,
            self.median,
            self.std,
            self.min,
            self.max,
            self.p25,
            self.p75,
        ]
    }

    pub fn is_missing(&self) -> bool {
        self.mean.is_nan()
    }
}

/// Non-NaN samples in ascending order.
pub fn sorted_valid<S, D>(values: &ArrayBase<S, D>) -> Vec<f64>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let mut valid: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    valid.sort_by(f64::total_cmp);
    valid
}

/// Percentile `p` (0 to 100) of an ascending slice, linear interpolation between the closest
/// ranks. `None` for an empty slice.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let rank = (p.clamp(0.0, 100.0) / 100.0) * last as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let fraction = rank - lo as f64;

    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * fraction)
}

pub fn summarize<S, D>(values: &ArrayBase<S, D>) -> BandSummary
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    summarize_sorted(&sorted_valid(values))
}

pub fn summarize_sorted(sorted: &[f64]) -> BandSummary {
    if sorted.is_empty() {
        return BandSummary::missing();
    }

    let n = sorted.len() as f64;
    let mean = sorted.iter().sum::<f64>() / n;
    let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    // `percentile` only fails on empty input, ruled out above.
    let pct = |p: f64| percentile(sorted, p).unwrap_or(f64::NAN);

    BandSummary {
        mean,
        median: pct(50.0),
        std: variance.sqrt(),
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        p25: pct(25.0),
        p75: pct(75.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, array};

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-12, "{a} != {b}");
    }

    #[test]
    fn test_percentile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];

        assert_close(percentile(&sorted, 0.0).unwrap(), 1.0);
        assert_close(percentile(&sorted, 25.0).unwrap(), 1.75);
        assert_close(percentile(&sorted, 50.0).unwrap(), 2.5);
        assert_close(percentile(&sorted, 75.0).unwrap(), 3.25);
        assert_close(percentile(&sorted, 100.0).unwrap(), 4.0);
        assert!(percentile(&[], 50.0).is_none());
        assert_close(percentile(&[7.0], 25.0).unwrap(), 7.0);
    }

    #[test]
    fn test_summary_ignores_nan() {
        let values = array![[1.0, f64::NAN], [3.0, 2.0], [f64::NAN, 4.0]];
        let summary = summarize(&values);

        assert_close(summary.mean, 2.5);
        assert_close(summary.median, 2.5);
        assert_close(summary.std, 1.25f64.sqrt());
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 4.0);
        assert_close(summary.p25, 1.75);
        assert_close(summary.p75, 3.25);
        assert_eq!(sorted_valid(&values), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_all_missing_summary() {
        let values = array![[f64::NAN, f64::NAN]];
        let summary = summarize(&values);

        assert!(summary.is_missing());
        assert!(summary.values().iter().all(|v| v.is_nan()));
        assert!(percentile(&sorted_valid(&values), 25.0).is_none());
    }

    #[test]
    fn test_summary_is_order_stable() {
        let values: Vec<f64> = (0..97).map(|i| ((i * 37) % 101) as f64 * 0.013 - 0.4).collect();
        let mut reversed = values.clone();
        reversed.reverse();
        let mut rotated = values.clone();
        rotated.rotate_left(41);

        let expected = summarize(&Array1::from(values));
        for permuted in [reversed, rotated] {
            let summary = summarize(&Array1::from(permuted));
            let bits = |s: &BandSummary| s.values().map(f64::to_bits);
            assert_eq!(bits(&summary), bits(&expected));
        }
    }
}
