//! Basic robust statistics over depth vectors
//!

/// Scales a median absolute deviation to approximate the standard deviation of a normal
/// distribution
pub const MAD_SCALE_FACTOR: f64 = 1.428;

/// Sort values in ascending order, NaN values are sorted last
pub fn sort_values(values: &mut [f64]) {
    values.sort_by(|a, b| a.total_cmp(b));
}

/// Arithmetic mean, or None for empty input
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Weighted mean over (value, weight) pairs
///
/// Returns 0 for empty input
///
pub fn weighted_mean(values: impl Iterator<Item = (f64, f64)>) -> f64 {
    let mut count = 0;
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    for (value, weight) in values {
        weighted_sum += value * weight;
        total_weight += weight;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        weighted_sum / total_weight
    }
}

/// Median of values which are already sorted in ascending order
///
/// Even length input returns the mean of the two central values
///
pub fn median_of_sorted(sorted_values: &[f64]) -> f64 {
    let len = sorted_values.len();
    assert!(len > 0, "Cannot find median of empty array");
    if len % 2 == 0 {
        0.5 * (sorted_values[len / 2 - 1] + sorted_values[len / 2])
    } else {
        sorted_values[len / 2]
    }
}

/// Median of values in any order, `values` is sorted as a side effect
pub fn median(values: &mut [f64]) -> f64 {
    sort_values(values);
    median_of_sorted(values)
}

/// Median absolute deviation of values from `center` (unscaled)
pub fn median_abs_deviation(values: &[f64], center: f64) -> f64 {
    let mut deviations = values.iter().map(|x| (x - center).abs()).collect::<Vec<_>>();
    median(&mut deviations)
}

/// Root mean square deviation of values from a fixed `center`
///
/// This is the population standard deviation when `center` is the mean.
///
pub fn rms_deviation(values: &[f64], center: f64) -> f64 {
    assert!(!values.is_empty());
    let sum_sq = values.iter().map(|x| (x - center).powi(2)).sum::<f64>();
    (sum_sq / values.len() as f64).sqrt()
}

/// Pearson correlation coefficient of two equal-length arrays
///
/// Returns NaN if either array has zero variance
///
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> f64 {
    assert_eq!(
        x.len(),
        y.len(),
        "Cannot find correlation of arrays with different lengths"
    );
    let x_mean = mean(x).expect("Cannot find correlation of empty arrays");
    let y_mean = mean(y).unwrap();

    let mut sum_xy = 0.0;
    let mut sum_xx = 0.0;
    let mut sum_yy = 0.0;
    for (xv, yv) in x.iter().zip(y.iter()) {
        let dx = xv - x_mean;
        let dy = yv - y_mean;
        sum_xy += dx * dy;
        sum_xx += dx * dx;
        sum_yy += dy * dy;
    }
    sum_xy / (sum_xx * sum_yy).sqrt()
}
