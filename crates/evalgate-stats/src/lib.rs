//! Descriptive statistics for score samples.
//!
//! Everything here is pure and total: empty and single-element samples are
//! valid input with documented degenerate output, never an error.

use evalgate_types::DescriptiveStats;

/// Summarize a sample.
///
/// - `sample_size` counts duplicates.
/// - `mean` and `median` are `0.0` for an empty sample.
/// - `std_dev` is the sample standard deviation (divisor `n - 1`) and is
///   `0.0` when there are fewer than two observations.
pub fn describe(values: &[f64]) -> DescriptiveStats {
    DescriptiveStats {
        sample_size: values.len(),
        mean: mean(values),
        median: median(values),
        std_dev: sample_std_dev(values),
    }
}

/// Arithmetic mean, `0.0` for an empty sample.
///
/// Summation runs in input order so repeated calls are bit-identical.
/// Values are shifted by the first observation before summing, which keeps
/// the mean of a constant sample exactly equal to that constant.
pub fn mean(values: &[f64]) -> f64 {
    let Some(&shift) = values.first() else {
        return 0.0;
    };
    let offset: f64 = values.iter().map(|x| x - shift).sum();
    shift + offset / values.len() as f64
}

/// Median, `0.0` for an empty sample. Even-sized samples average the two
/// central values.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut v = values.to_vec();
    v.sort_by(f64::total_cmp);
    median_sorted(&v)
}

fn median_sorted(sorted: &[f64]) -> f64 {
    debug_assert!(!sorted.is_empty());
    let n = sorted.len();
    let mid = n / 2;
    if n % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

/// Unbiased sample variance (divisor `n - 1`), `0.0` below two observations.
///
/// Inferential code must use this rather than squaring a rounded standard
/// deviation.
pub fn sample_variance(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|x| (x - m).powi(2)).sum();
    ss / (n - 1) as f64
}

pub fn sample_std_dev(values: &[f64]) -> f64 {
    sample_variance(values).sqrt()
}
