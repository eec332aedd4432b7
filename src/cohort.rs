use log::info;

use crate::chrom_list::ChromList;
use crate::sample::SampleData;
use crate::target_region::TargetRegion;

/// All samples and target regions of one analysis
///
/// Samples and regions live in dense owned vectors. Every other structure refers to them by
/// index. QC-failing entries are moved into the removed collections by [`Cohort::compact`].
///
pub struct Cohort {
    pub chrom_list: ChromList,
    pub regions: Vec<TargetRegion>,
    pub samples: Vec<SampleData>,

    pub removed_regions: Vec<TargetRegion>,
    pub removed_samples: Vec<SampleData>,

    /// Name of every input sample, indexed by sample id
    pub sample_names: Vec<String>,

    /// Mean authoritative depth of all QC-passing samples
    pub mean_sample_depth: f64,
}

/// Counts of entries moved out of the cohort by compaction
#[derive(Debug, Default, PartialEq)]
pub struct CompactionCounts {
    pub removed_region_count: usize,
    pub removed_sample_count: usize,
}

impl Cohort {
    pub fn new(chrom_list: ChromList, regions: Vec<TargetRegion>, samples: Vec<SampleData>) -> Self {
        let sample_names = samples.iter().map(|x| x.name.clone()).collect();
        Self {
            chrom_list,
            regions,
            samples,
            removed_regions: Vec::new(),
            removed_samples: Vec::new(),
            sample_names,
            mean_sample_depth: 0.0,
        }
    }

    pub fn is_compacted(&self) -> bool {
        self.samples.iter().all(|x| x.qc.is_pass()) && self.regions.iter().all(|x| x.qc.is_pass())
    }

    /// Move all QC-failing samples and regions into the removed collections
    ///
    /// Passing entries keep their relative order and are re-indexed densely. All per-region
    /// vectors of the passing samples are rebuilt from a region index remap table.
    ///
    pub fn compact(&mut self) -> CompactionCounts {
        let (kept_regions, removed_regions): (Vec<_>, Vec<_>) = std::mem::take(&mut self.regions)
            .into_iter()
            .partition(|x| x.qc.is_pass());

        // New region index to previous region index
        let region_remap = kept_regions.iter().map(|x| x.index).collect::<Vec<_>>();

        self.regions = kept_regions
            .into_iter()
            .enumerate()
            .map(|(region_index, mut region)| {
                region.index = region_index;
                region
            })
            .collect();

        let (kept_samples, removed_samples): (Vec<_>, Vec<_>) = std::mem::take(&mut self.samples)
            .into_iter()
            .partition(|x| x.qc.is_pass());

        let remap = |values: &[f64]| {
            if values.is_empty() {
                return Vec::new();
            }
            region_remap
                .iter()
                .map(|&prev_index| values[prev_index])
                .collect::<Vec<_>>()
        };

        self.samples = kept_samples
            .into_iter()
            .map(|mut sample| {
                sample.depth = remap(&sample.depth);
                sample.norm_depth = remap(&sample.norm_depth);
                sample.reference = remap(&sample.reference);
                sample.reference_spread = remap(&sample.reference_spread);
                sample
            })
            .collect();

        let counts = CompactionCounts {
            removed_region_count: removed_regions.len(),
            removed_sample_count: removed_samples.len(),
        };

        self.removed_regions.extend(removed_regions);
        self.removed_samples.extend(removed_samples);

        info!(
            "Removed {} QC-failing samples and {} QC-failing regions, {} samples and {} regions remain",
            counts.removed_sample_count,
            counts.removed_region_count,
            self.samples.len(),
            self.regions.len()
        );

        counts
    }

    /// Find a sample by name in either the passing or removed collections
    ///
    /// The boolean is true if the sample passed QC
    ///
    pub fn find_sample(&self, name: &str) -> Option<(&SampleData, bool)> {
        if let Some(sample) = self.samples.iter().find(|x| x.name == name) {
            Some((sample, true))
        } else {
            self.removed_samples
                .iter()
                .find(|x| x.name == name)
                .map(|x| (x, false))
        }
    }
}

#[cfg(test)]
pub mod test_utils {
    use super::*;
    use crate::chrom_list::ChromType;

    /// Build a cohort with one region per entry of `region_chroms`, each region 100 bases long
    ///
    /// `depth` gives the raw depth of each sample, all samples are reference-eligible.
    ///
    pub fn get_test_cohort(region_chroms: &[(&str, ChromType)], depth: &[Vec<f64>]) -> Cohort {
        let mut chrom_list = ChromList::default();
        let mut regions = Vec::new();
        for (region_id, (label, chrom_type)) in region_chroms.iter().enumerate() {
            let chrom_index = match chrom_list.label_to_index.get(*label) {
                Some(&x) => x,
                None => chrom_list.add_chrom(label, *chrom_type),
            };
            let start = 1000 * region_id as i64;
            regions.push(TargetRegion::new(region_id, chrom_index, start, start + 100));
        }

        let samples = depth
            .iter()
            .enumerate()
            .map(|(sample_id, d)| {
                assert_eq!(d.len(), regions.len());
                SampleData::new(sample_id, &format!("s{sample_id}"), true, d.clone())
            })
            .collect();

        Cohort::new(chrom_list, regions, samples)
    }
}

#[cfg(test)]
mod tests {
    use super::test_utils::get_test_cohort;
    use super::*;
    use crate::chrom_list::ChromType;
    use crate::qc_flags::{RegionQcFlag, SampleQcFlag};

    #[test]
    fn test_compact() {
        let a = ("chr1", ChromType::Autosome);
        let depth = vec![
            vec![1.0, 2.0, 3.0, 4.0],
            vec![5.0, 6.0, 7.0, 8.0],
            vec![9.0, 10.0, 11.0, 12.0],
        ];
        let mut cohort = get_test_cohort(&[a, a, a, a], &depth);
        for sample in cohort.samples.iter_mut() {
            sample.norm_depth = sample.depth.clone();
            sample.reference = sample.depth.clone();
            sample.reference_spread = sample.depth.clone();
        }
        cohort.regions[1].qc.push(RegionQcFlag::Excluded);
        cohort.samples[1].qc.push(SampleQcFlag::LowReferenceCorrelation(0.5));

        let counts = cohort.compact();
        assert_eq!(
            counts,
            CompactionCounts {
                removed_region_count: 1,
                removed_sample_count: 1,
            }
        );

        assert!(cohort.is_compacted());
        assert_eq!(cohort.regions.len(), 3);
        assert_eq!(
            cohort.regions.iter().map(|x| x.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(
            cohort.regions.iter().map(|x| x.id).collect::<Vec<_>>(),
            vec![0, 2, 3]
        );
        assert_eq!(cohort.removed_regions[0].id, 1);

        assert_eq!(cohort.samples.len(), 2);
        assert_eq!(cohort.samples[1].id, 2);
        assert_eq!(cohort.samples[1].depth, vec![9.0, 11.0, 12.0]);
        assert_eq!(cohort.samples[0].reference_spread, vec![1.0, 3.0, 4.0]);
        assert_eq!(cohort.removed_samples[0].name, "s1");

        // Compaction of a passing cohort changes nothing
        let counts = cohort.compact();
        assert_eq!(counts, CompactionCounts::default());
        assert_eq!(cohort.samples[1].depth, vec![9.0, 11.0, 12.0]);
    }

    #[test]
    fn test_find_sample() {
        let a = ("chr1", ChromType::Autosome);
        let mut cohort = get_test_cohort(&[a], &[vec![1.0], vec![2.0]]);
        cohort.samples[0].qc.push(SampleQcFlag::LowDepth(1.0));
        cohort.compact();

        assert!(matches!(cohort.find_sample("s1"), Some((_, true))));
        assert!(matches!(cohort.find_sample("s0"), Some((_, false))));
        assert!(cohort.find_sample("s9").is_none());
    }
}
