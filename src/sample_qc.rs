use log::info;

use crate::qc_flags::SampleQcFlag;
use crate::sample::SampleData;

pub struct SampleQcSettings {
    /// Minimum correlation of a sample's normalized depth to its synthetic reference
    pub min_reference_correlation: f64,
}

/// Flag samples with low or undefined correlation to their synthetic reference
///
/// Returns the total number of QC-failing samples, including those flagged for low depth.
///
pub fn run_sample_qc(settings: &SampleQcSettings, samples: &mut [SampleData]) -> usize {
    for sample in samples.iter_mut() {
        let correlation = sample.reference_correlation;
        if correlation.is_nan() || correlation < settings.min_reference_correlation {
            sample
                .qc
                .push(SampleQcFlag::LowReferenceCorrelation(correlation));
        }
    }

    let failed_sample_count = samples.iter().filter(|x| !x.qc.is_pass()).count();
    info!(
        "Samples failing QC: {} of {}",
        failed_sample_count,
        samples.len()
    );
    failed_sample_count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_sample_qc() {
        let mut samples = (0..4)
            .map(|id| SampleData::new(id, &format!("s{id}"), true, Vec::new()))
            .collect::<Vec<_>>();
        samples[0].reference_correlation = 0.99;
        samples[1].reference_correlation = 0.90;
        samples[2].reference_correlation = f64::NAN;
        samples[3].reference_correlation = 0.99;
        samples[3].qc.push(SampleQcFlag::LowDepth(10.0));

        let settings = SampleQcSettings {
            min_reference_correlation: 0.95,
        };
        let failed_count = run_sample_qc(&settings, &mut samples);
        assert_eq!(failed_count, 3);
        assert!(samples[0].qc.is_pass());
        assert_eq!(samples[1].qc.to_string(), "corr=0.900");
        assert_eq!(samples[2].qc.to_string(), "corr=NaN");
        assert_eq!(samples[3].qc.to_string(), "avg_depth=10.00");
    }
}
