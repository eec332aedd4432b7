//! Fixed-width histograms summarized in the log
//!

use log::info;

use crate::call_cnvs::ResultCell;
use crate::sample::SampleData;
use crate::stats_utils::{MAD_SCALE_FACTOR, median, median_abs_deviation};
use crate::target_region::TargetRegion;

/// Counts of values over fixed-width bins spanning [min, max)
///
/// Values outside of the histogram range are counted in the first or last bin. NaN values are
/// not counted.
///
pub struct Histogram {
    min: f64,
    bin_size: f64,
    bins: Vec<usize>,
}

impl Histogram {
    pub fn new(min: f64, max: f64, bin_size: f64) -> Self {
        assert!(
            max > min && bin_size > 0.0,
            "Invalid histogram range [{min}, {max}) with bin size {bin_size}"
        );
        let bin_count = std::cmp::max(1, ((max - min) / bin_size).round() as usize);
        Self {
            min,
            bin_size,
            bins: vec![0; bin_count],
        }
    }

    pub fn inc(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }
        let last_bin_index = self.bins.len() - 1;
        let bin = ((value - self.min) / self.bin_size).floor();
        let bin_index = if bin < 0.0 {
            0
        } else {
            std::cmp::min(bin as usize, last_bin_index)
        };
        self.bins[bin_index] += 1;
    }

    /// Log each bin as 'start-end: count'
    ///
    /// # Arguments
    /// * `precision` - Number of decimal places used for the bin boundaries
    ///
    pub fn log(&self, title: &str, precision: usize) {
        info!("{title}:");
        for (bin_index, count) in self.bins.iter().enumerate() {
            let start = self.min + bin_index as f64 * self.bin_size;
            let end = start + self.bin_size;
            info!("  {start:.precision$}-{end:.precision$}: {count}");
        }
    }
}

/// Log the coefficient of variation histogram of QC-passing regions
pub fn log_region_cv_histogram(regions: &[TargetRegion]) {
    let mut hist = Histogram::new(0.0, 0.5, 0.05);
    for region in regions.iter().filter(|x| x.qc.is_pass()) {
        hist.inc(region.cv());
    }
    hist.log(
        "Region coefficient of variation (normalized depth) histogram",
        2,
    );
}

/// Log the histogram of sample correlation to their synthetic references
pub fn log_reference_correlation_histogram(samples: &[SampleData]) {
    let mut hist = Histogram::new(0.8, 1.0, 0.02);
    for sample in samples.iter() {
        hist.inc(sample.reference_correlation);
    }
    hist.log("Reference sample correlation histogram", 2);
}

/// Log the histogram of all result cell z-scores
pub fn log_z_score_histogram(cells: &[ResultCell]) {
    let mut hist = Histogram::new(-6.0, 6.0, 1.0);
    for cell in cells.iter() {
        hist.inc(cell.z);
    }
    hist.log("Overall z-score histogram", 0);
}

/// Log the histogram of CNV event counts per sample
///
/// The histogram spans 20 bins from zero to the median plus three scaled MADs of the counts.
///
pub fn log_sample_event_histogram(sample_event_counts: &[usize]) {
    if sample_event_counts.is_empty() {
        return;
    }
    let mut counts = sample_event_counts
        .iter()
        .map(|&x| x as f64)
        .collect::<Vec<_>>();
    let count_median = median(&mut counts);
    let count_mad = MAD_SCALE_FACTOR * median_abs_deviation(&counts, count_median);
    let max = (count_median + 3.0 * count_mad).max(1.0);

    let mut hist = Histogram::new(0.0, max, max / 20.0);
    for &count in counts.iter() {
        hist.inc(count);
    }
    hist.log("CNV events per sample histogram", 2);
}
