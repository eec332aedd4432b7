use log::info;

use crate::chrom_list::{ChromList, ChromType};
use crate::cohort::Cohort;
use crate::genome_regions::GenomeRegions;
use crate::qc_flags::RegionQcFlag;
use crate::sample::SampleData;
use crate::stats_utils::{MAD_SCALE_FACTOR, mean, median, median_abs_deviation};
use crate::target_region::TargetRegion;

pub struct RegionQcSettings {
    /// Minimum median normalized depth
    pub min_norm_depth: f64,

    /// Minimum median absolute depth, approximated as median normalized depth times the mean
    /// sample depth
    pub min_depth: f64,

    /// Maximum coefficient of variation of normalized depth
    pub max_cv: f64,
}

/// Mean authoritative depth over QC-passing samples
///
/// Returns None if no sample passes QC
///
pub fn get_mean_passing_sample_depth(samples: &[SampleData]) -> Option<f64> {
    let depths = samples
        .iter()
        .filter(|x| x.qc.is_pass())
        .map(|x| x.depth_mean)
        .collect::<Vec<_>>();
    mean(&depths)
}

/// Find the normalized depth median and MAD of one region over all QC-passing samples, and
/// set all region QC flags
///
/// Any existing region flags are replaced, so repeated calls give the same result.
///
fn update_region_qc(
    settings: &RegionQcSettings,
    chrom_list: &ChromList,
    excluded_regions: &GenomeRegions,
    samples: &[SampleData],
    mean_sample_depth: f64,
    region: &mut TargetRegion,
) {
    let mut values = samples
        .iter()
        .filter(|x| x.qc.is_pass())
        .map(|sample| {
            let value = sample.norm_depth[region.index];
            if !value.is_finite() {
                panic!(
                    "Normalized depth is invalid for sample '{}' in region '{}': {}",
                    sample.name,
                    region.to_region_str(chrom_list),
                    value
                );
            }
            value
        })
        .collect::<Vec<_>>();
    assert!(
        !values.is_empty(),
        "Region QC requires at least one QC-passing sample"
    );

    region.median = median(&mut values);
    region.mad = MAD_SCALE_FACTOR * median_abs_deviation(&values, region.median);

    region.qc.clear();
    if region.median < settings.min_norm_depth {
        region
            .qc
            .push(RegionQcFlag::LowNormalizedDepth(settings.min_norm_depth));
    }
    if region.median * mean_sample_depth < settings.min_depth {
        region.qc.push(RegionQcFlag::LowDepth(settings.min_depth));
    }
    if region.cv() > settings.max_cv {
        region
            .qc
            .push(RegionQcFlag::HighCoefficientOfVariation(settings.max_cv));
    }
    let chrom_label = chrom_list.label(region.chrom_index);
    if excluded_regions.intersect(chrom_label, region.start, region.end) {
        region.qc.push(RegionQcFlag::Excluded);
    }
    if chrom_list.chrom_type(region.chrom_index) == ChromType::Y {
        region.qc.push(RegionQcFlag::ChrY);
    }
}

/// Compute robust normalized depth statistics for every region and flag failing regions
///
/// The cohort's mean sample depth must already be set. Returns the number of failing regions.
///
pub fn run_region_qc(
    settings: &RegionQcSettings,
    excluded_regions: &GenomeRegions,
    cohort: &mut Cohort,
) -> usize {
    info!("Checking for low quality regions");
    for region in cohort.regions.iter_mut() {
        update_region_qc(
            settings,
            &cohort.chrom_list,
            excluded_regions,
            &cohort.samples,
            cohort.mean_sample_depth,
            region,
        );
    }
    let failed_region_count = cohort.regions.iter().filter(|x| !x.qc.is_pass()).count();
    info!(
        "Regions failing QC: {} of {}",
        failed_region_count,
        cohort.regions.len()
    );
    failed_region_count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohort::test_utils::get_test_cohort;
    use crate::qc_flags::SampleQcFlag;
    use approx::assert_ulps_eq;

    const A: (&str, ChromType) = ("chr1", ChromType::Autosome);
    const Y: (&str, ChromType) = ("chrY", ChromType::Y);

    fn default_settings() -> RegionQcSettings {
        RegionQcSettings {
            min_norm_depth: 0.01,
            min_depth: 20.0,
            max_cv: 0.3,
        }
    }

    /// Build a cohort with normalized depth set directly
    fn get_norm_cohort(region_chroms: &[(&str, ChromType)], norm_depth: &[Vec<f64>]) -> Cohort {
        let mut cohort = get_test_cohort(region_chroms, norm_depth);
        for sample in cohort.samples.iter_mut() {
            sample.norm_depth = sample.depth.clone();
            sample.depth_mean = 100.0;
        }
        cohort.mean_sample_depth = get_mean_passing_sample_depth(&cohort.samples).unwrap();
        cohort
    }

    #[test]
    fn test_region_qc() {
        let mut cohort = get_norm_cohort(
            &[A, A, A, A, Y],
            &[
                vec![1.0, 0.1, 0.0, 0.5, 1.0],
                vec![1.1, 0.1, 0.0, 1.0, 1.0],
                vec![0.9, 0.1, 0.0, 1.5, 1.0],
            ],
        );
        let mut excluded_regions = GenomeRegions::new();
        excluded_regions.add_region("chr1", 3050, 3060);

        let failed_count = run_region_qc(&default_settings(), &excluded_regions, &mut cohort);
        assert_eq!(failed_count, 4);

        let regions = &cohort.regions;
        assert!(regions[0].qc.is_pass());
        assert_ulps_eq!(regions[0].median, 1.0);
        assert_ulps_eq!(regions[0].mad, MAD_SCALE_FACTOR * 0.1, max_ulps = 8);
        assert_eq!(regions[1].qc.to_string(), "cov<20");
        assert_eq!(regions[2].qc.to_string(), "ncov<0.01 cov<20");
        assert_eq!(regions[3].qc.to_string(), "cv>0.3 excluded");
        assert_eq!(regions[4].qc.to_string(), "chrY");
    }

    #[test]
    fn test_region_qc_ignores_failed_samples() {
        let mut cohort = get_norm_cohort(&[A], &[vec![1.0], vec![1.0], vec![100.0], vec![100.0]]);
        cohort.samples[2].qc.push(SampleQcFlag::LowDepth(1.0));
        cohort.samples[3].qc.push(SampleQcFlag::LowDepth(1.0));
        run_region_qc(&default_settings(), &GenomeRegions::new(), &mut cohort);
        assert_ulps_eq!(cohort.regions[0].median, 1.0);
    }

    #[test]
    fn test_region_qc_idempotent() {
        let mut cohort = get_norm_cohort(
            &[A, A, A],
            &[
                vec![1.0, 0.1, 0.5],
                vec![1.1, 0.1, 1.0],
                vec![0.9, 0.1, 1.5],
            ],
        );
        let excluded_regions = GenomeRegions::new();
        run_region_qc(&default_settings(), &excluded_regions, &mut cohort);
        let first_flags = cohort
            .regions
            .iter()
            .map(|x| x.qc.clone())
            .collect::<Vec<_>>();

        run_region_qc(&default_settings(), &excluded_regions, &mut cohort);
        let second_flags = cohort
            .regions
            .iter()
            .map(|x| x.qc.clone())
            .collect::<Vec<_>>();
        assert_eq!(first_flags, second_flags);
    }

    #[test]
    #[should_panic]
    fn test_invalid_norm_depth() {
        let mut cohort = get_norm_cohort(&[A], &[vec![1.0], vec![f64::NAN]]);
        run_region_qc(&default_settings(), &GenomeRegions::new(), &mut cohort);
    }
}
