//! Per-sample depth normalization by chromosome compartment
//!

use log::info;

use crate::chrom_list::{ChromList, ChromType};
use crate::cohort::Cohort;
use crate::qc_flags::SampleQcFlag;
use crate::sample::SampleData;
use crate::stats_utils::{rms_deviation, weighted_mean};
use crate::target_region::TargetRegion;

/// Compartment mean depth below which a sample fails QC, if regions of that compartment exist
const MIN_COMPARTMENT_DEPTH: f64 = 5.0;

pub struct NormalizeSettings {
    /// Minimum authoritative compartment mean depth for a sample to pass QC
    pub min_sample_depth: f64,
}

#[derive(Debug, Default, PartialEq)]
pub struct CompartmentRegionCounts {
    pub autosome: usize,
    pub x: usize,
    pub y: usize,
    pub other: usize,
}

impl CompartmentRegionCounts {
    pub fn new(chrom_list: &ChromList, regions: &[TargetRegion]) -> Self {
        let mut counts = Self::default();
        for region in regions.iter() {
            match chrom_list.chrom_type(region.chrom_index) {
                ChromType::Autosome => counts.autosome += 1,
                ChromType::X => counts.x += 1,
                ChromType::Y => counts.y += 1,
                ChromType::Other => counts.other += 1,
            }
        }
        counts
    }

    /// True if the X-chromosome mean should be used as the sample's authoritative mean depth
    pub fn is_x_authoritative(&self) -> bool {
        self.x > self.autosome
    }
}

/// Normalize the depth of one sample and record depth-based QC flags
///
/// Autosome regions are divided by the autosome mean depth and X-chromosome regions by the
/// X-chromosome mean depth. All other regions are set to zero.
///
pub fn normalize_sample_depth(
    settings: &NormalizeSettings,
    chrom_list: &ChromList,
    regions: &[TargetRegion],
    region_counts: &CompartmentRegionCounts,
    sample: &mut SampleData,
) {
    let get_compartment_mean = |chrom_type: ChromType| {
        weighted_mean(
            regions
                .iter()
                .zip(sample.depth.iter())
                .filter(|(region, _)| chrom_list.chrom_type(region.chrom_index) == chrom_type)
                .map(|(region, &depth)| (depth, region.size() as f64)),
        )
    };
    let autosome_mean = get_compartment_mean(ChromType::Autosome);
    let x_mean = get_compartment_mean(ChromType::X);

    sample.norm_depth = regions
        .iter()
        .zip(sample.depth.iter())
        .map(
            |(region, &depth)| match chrom_list.chrom_type(region.chrom_index) {
                ChromType::Autosome if autosome_mean > 0.0 => depth / autosome_mean,
                ChromType::X if x_mean > 0.0 => depth / x_mean,
                _ => 0.0,
            },
        )
        .collect();

    sample.depth_mean = if region_counts.is_x_authoritative() {
        x_mean
    } else {
        autosome_mean
    };
    sample.norm_depth_stdev = if sample.norm_depth.is_empty() {
        0.0
    } else {
        rms_deviation(&sample.norm_depth, 1.0)
    };

    if sample.depth_mean < settings.min_sample_depth {
        sample.qc.push(SampleQcFlag::LowDepth(sample.depth_mean));
    }
    if region_counts.x > 0 && x_mean < MIN_COMPARTMENT_DEPTH {
        sample.qc.push(SampleQcFlag::LowChrXDepth(x_mean));
    }
    if region_counts.autosome > 0 && autosome_mean < MIN_COMPARTMENT_DEPTH {
        sample.qc.push(SampleQcFlag::LowAutosomeDepth(autosome_mean));
    }

    if sample.qc.is_pass() {
        if !sample.depth_mean.is_finite() {
            panic!(
                "Mean depth is invalid for sample '{}': {}",
                sample.name, sample.depth_mean
            );
        }
        if !sample.norm_depth_stdev.is_finite() {
            panic!(
                "Normalized depth standard deviation is invalid for sample '{}': {}",
                sample.name, sample.norm_depth_stdev
            );
        }
    }
}

/// Normalize depth for all samples in the cohort
///
/// Returns the number of samples failing depth QC
///
pub fn normalize_cohort_depth(settings: &NormalizeSettings, cohort: &mut Cohort) -> usize {
    let region_counts = CompartmentRegionCounts::new(&cohort.chrom_list, &cohort.regions);
    info!("Normalizing sample depth");
    info!("Autosome regions: {}", region_counts.autosome);
    info!("ChrX regions: {}", region_counts.x);
    info!("ChrY regions: {} (ignored)", region_counts.y);
    info!(
        "Regions on other chromosomes: {} (ignored)",
        region_counts.other
    );

    for sample in cohort.samples.iter_mut() {
        normalize_sample_depth(
            settings,
            &cohort.chrom_list,
            &cohort.regions,
            &region_counts,
            sample,
        );
    }

    let failed_sample_count = cohort.samples.iter().filter(|x| !x.qc.is_pass()).count();
    info!(
        "Samples failing depth QC: {} of {}",
        failed_sample_count,
        cohort.samples.len()
    );
    failed_sample_count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohort::test_utils::get_test_cohort;
    use approx::assert_ulps_eq;

    const A: (&str, ChromType) = ("chr1", ChromType::Autosome);
    const X: (&str, ChromType) = ("chrX", ChromType::X);
    const Y: (&str, ChromType) = ("chrY", ChromType::Y);
    const M: (&str, ChromType) = ("chrM", ChromType::Other);

    fn default_settings() -> NormalizeSettings {
        NormalizeSettings {
            min_sample_depth: 40.0,
        }
    }

    #[test]
    fn test_normalize_sample_depth() {
        let mut cohort = get_test_cohort(
            &[A, A, A, X, Y, M],
            &[vec![100.0, 50.0, 150.0, 40.0, 30.0, 1000.0]],
        );
        normalize_cohort_depth(&default_settings(), &mut cohort);

        let sample = &cohort.samples[0];
        assert!(sample.qc.is_pass());
        assert_ulps_eq!(sample.depth_mean, 100.0);
        assert_ulps_eq!(sample.norm_depth[0], 1.0);
        assert_ulps_eq!(sample.norm_depth[1], 0.5);
        assert_ulps_eq!(sample.norm_depth[2], 1.5);
        assert_ulps_eq!(sample.norm_depth[3], 1.0);
        assert_ulps_eq!(sample.norm_depth[4], 0.0);
        assert_ulps_eq!(sample.norm_depth[5], 0.0);

        // Authoritative compartment normalized mean is 1
        let auto_mean = weighted_mean(
            sample.norm_depth[..3]
                .iter()
                .zip(cohort.regions.iter())
                .map(|(&d, r)| (d, r.size() as f64)),
        );
        assert_ulps_eq!(auto_mean, 1.0);
    }

    #[test]
    fn test_x_authoritative() {
        let mut cohort = get_test_cohort(&[A, X, X], &[vec![100.0, 60.0, 60.0]]);
        normalize_cohort_depth(&default_settings(), &mut cohort);
        assert_ulps_eq!(cohort.samples[0].depth_mean, 60.0);
    }

    #[test]
    fn test_depth_qc() {
        let mut cohort = get_test_cohort(
            &[A, A, X],
            &[vec![30.0, 30.0, 3.0], vec![100.0, 100.0, 50.0]],
        );
        let failed_count = normalize_cohort_depth(&default_settings(), &mut cohort);
        assert_eq!(failed_count, 1);
        assert_eq!(
            cohort.samples[0].qc.to_string(),
            "avg_depth=30.00 avg_depth_chrx=3.00"
        );
        assert!(cohort.samples[1].qc.is_pass());
    }

    #[test]
    fn test_zero_depth_sample() {
        let mut cohort = get_test_cohort(&[A, A], &[vec![0.0, 0.0]]);
        normalize_cohort_depth(&default_settings(), &mut cohort);
        let sample = &cohort.samples[0];
        assert_eq!(
            sample.qc.to_string(),
            "avg_depth=0.00 avg_depth_autosomes=0.00"
        );
        assert_eq!(sample.norm_depth, vec![0.0, 0.0]);
    }

    #[test]
    fn test_single_base_regions() {
        let mut cohort = get_test_cohort(&[A, A], &[vec![100.0, 80.0]]);
        for region in cohort.regions.iter_mut() {
            region.end = region.start;
        }
        normalize_cohort_depth(&default_settings(), &mut cohort);

        let sample = &cohort.samples[0];
        assert!(sample.qc.is_pass());
        assert_ulps_eq!(sample.depth_mean, 90.0);
        assert_ulps_eq!(sample.norm_depth[0], 100.0 / 90.0);
    }

    #[test]
    #[should_panic]
    fn test_invalid_mean_on_passing_sample() {
        // Infinite depth passes the depth thresholds but gives a non-finite mean
        let mut cohort = get_test_cohort(&[A], &[vec![f64::INFINITY]]);
        normalize_cohort_depth(&default_settings(), &mut cohort);
    }
}
