//! Call CNV events from the per-cell z-scores of the compacted cohort
//!
//! Calling proceeds through four steps:
//! 1. Seed single-cell ranges at z-score outliers and homozygous deletions
//! 2. Extend each seed along the genome through cells with the same trend
//! 3. Merge adjacent ranges, then optionally bridge small gaps between ranges
//! 4. Count final events per sample and per region
//!

mod cell_stats;
mod event_counts;
mod extend_ranges;
mod merge_ranges;
mod seed_ranges;

use log::info;
use serde::{Deserialize, Serialize};
use thousands::Separable;

pub use self::cell_stats::{DEFAULT_COPY_NUMBER, ResultCell};
use self::cell_stats::get_result_cells;
use self::event_counts::{EventCounts, count_events};
use self::extend_ranges::extend_ranges;
use self::merge_ranges::{merge_adjacent_ranges, merge_gapped_ranges};
use self::seed_ranges::get_seed_ranges;
use crate::cohort::Cohort;

#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::Display)]
pub enum CnvType {
    #[strum(serialize = "INS")]
    Ins,
    #[strum(serialize = "DEL")]
    Del,
}

/// A run of same-trend cells for one sample on one chromosome
///
/// `start` and `end` are closed indexes into the sample-major result cell list.
///
#[derive(Clone, Debug, PartialEq)]
pub struct CnvRange {
    pub sample_index: usize,
    pub start: usize,
    pub end: usize,
    pub cnv_type: CnvType,
}

impl CnvRange {
    /// Number of cells in the range
    pub fn size(&self) -> usize {
        self.end + 1 - self.start
    }
}

/// A cell passing the seed test whose copy number estimate is still the default
#[derive(Clone, Debug)]
pub struct InconsistentSeed {
    pub sample_index: usize,
    pub region_index: usize,
    pub z: f64,
}

pub struct CallCnvSettings {
    /// Minimum absolute z-score for a cell to seed a CNV range
    pub min_z: f64,

    /// Minimum absolute z-score for a cell to extend a CNV range
    pub ext_min_z: f64,

    /// Maximum gap between two ranges that can be bridged, as a percentage of the ranges' total
    /// size. Gap bridging is disabled if this is zero.
    pub ext_gap_span: f64,

    /// Minimum reference normalized depth for the homozygous deletion seed test
    pub min_norm_depth: f64,

    /// Minimum reference absolute depth for the homozygous deletion seed test
    pub min_depth: f64,
}

impl Default for CallCnvSettings {
    fn default() -> Self {
        Self {
            min_z: 4.0,
            ext_min_z: 2.0,
            ext_gap_span: 20.0,
            min_norm_depth: 0.01,
            min_depth: 20.0,
        }
    }
}

#[derive(Clone, Default, Deserialize, Serialize)]
pub struct CallStats {
    pub seed_count: usize,
    pub inconsistent_seed_count: usize,
    pub extended_region_count: usize,
    pub range_count_before_merge: usize,
    pub range_count_after_merge: usize,
}

pub struct CnvCallResult {
    /// Statistics of every (sample, region) pair, in sample-major order
    pub cells: Vec<ResultCell>,

    /// Final CNV events
    pub ranges: Vec<CnvRange>,

    pub inconsistent_seeds: Vec<InconsistentSeed>,
    pub event_counts: EventCounts,
    pub stats: CallStats,
}

/// Call CNV ranges for all samples of a compacted cohort
///
pub fn call_cnvs(settings: &CallCnvSettings, cohort: &Cohort) -> CnvCallResult {
    assert!(
        cohort.is_compacted(),
        "CNV calling requires all QC-failing samples and regions to be removed"
    );

    let mut cells = get_result_cells(cohort);

    let mut stats = CallStats::default();

    info!("Detecting CNV seeds");
    let (mut ranges, inconsistent_seeds) =
        get_seed_ranges(settings, cohort.mean_sample_depth, &mut cells);
    stats.seed_count = ranges.len();
    stats.inconsistent_seed_count = inconsistent_seeds.len();
    info!(
        "Detected {} seed regions ({} inconsistent seeds skipped)",
        stats.seed_count.separate_with_commas(),
        stats.inconsistent_seed_count
    );

    stats.extended_region_count = extend_ranges(settings, &mut cells, &mut ranges);
    info!(
        "Extended seeds to {} additional regions",
        stats.extended_region_count.separate_with_commas()
    );

    stats.range_count_before_merge = ranges.len();
    merge_adjacent_ranges(&cells, &mut ranges);
    if settings.ext_gap_span > 0.0 {
        merge_gapped_ranges(settings.ext_gap_span, &mut cells, &mut ranges);
    }
    stats.range_count_after_merge = ranges.len();
    info!(
        "Merged {} ranges to {} ranges",
        stats.range_count_before_merge.separate_with_commas(),
        stats.range_count_after_merge.separate_with_commas()
    );

    let event_counts = count_events(&cells, &ranges, cohort.samples.len(), cohort.regions.len());

    CnvCallResult {
        cells,
        ranges,
        inconsistent_seeds,
        event_counts,
        stats,
    }
}

#[cfg(test)]
pub mod test_utils {
    use super::*;

    /// Build result cells for each sample from (normalized depth, z-score) pairs
    ///
    /// The reference of every cell is 1.0 and all cells are on chromosome 0.
    ///
    pub fn get_test_cells(samples: &[Vec<(f64, f64)>]) -> Vec<ResultCell> {
        let mut cells = Vec::new();
        for (sample_index, values) in samples.iter().enumerate() {
            for (region_index, &(norm_depth, z)) in values.iter().enumerate() {
                cells.push(ResultCell {
                    sample_index,
                    region_index,
                    chrom_index: 0,
                    norm_depth,
                    reference: 1.0,
                    z,
                    copies: DEFAULT_COPY_NUMBER,
                });
            }
        }
        cells
    }
}
