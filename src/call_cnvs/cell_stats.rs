use crate::cohort::Cohort;

/// Expected copy number of every target region
pub const DEFAULT_COPY_NUMBER: u32 = 2;

/// Absolute z-score values are clamped to this maximum
const MAX_ABS_Z_SCORE: f64 = 10.0;

/// Statistics of one (sample, region) pair of the compacted cohort
///
/// Cells are stored sample-major, so all cells of one sample are contiguous and in region order.
///
#[derive(Clone, Debug)]
pub struct ResultCell {
    pub sample_index: usize,
    pub region_index: usize,
    pub chrom_index: usize,

    /// Normalized depth of the sample
    pub norm_depth: f64,

    /// Synthetic reference normalized depth
    pub reference: f64,

    pub z: f64,

    /// Estimated copy number, left at the default until the cell is part of a seed or extension
    pub copies: u32,
}

impl ResultCell {
    pub fn estimate_copies(&self) -> u32 {
        get_copy_number(self.norm_depth, self.reference)
    }
}

/// Deviation of normalized depth from the reference in units of reference spread
///
/// Returns NaN if the reference or spread are zero.
///
pub fn get_z_score(norm_depth: f64, reference: f64, spread: f64) -> f64 {
    if reference == 0.0 || spread == 0.0 {
        f64::NAN
    } else {
        ((norm_depth - reference) / spread).clamp(-MAX_ABS_Z_SCORE, MAX_ABS_Z_SCORE)
    }
}

/// Integer copy number estimate from the ratio of normalized depth to the reference
///
/// Ratios implying fewer than 2 copies always round down, so any depth reduction is at least a
/// single copy loss.
///
pub fn get_copy_number(norm_depth: f64, reference: f64) -> u32 {
    if !(reference > 0.0 && reference.is_finite()) {
        return DEFAULT_COPY_NUMBER;
    }
    let copies = 2.0 * norm_depth / reference;
    if copies < 0.2 {
        0
    } else if copies < 1.0 {
        1
    } else {
        copies.round() as u32
    }
}

/// Get the statistics of every (sample, region) pair in sample-major order
pub fn get_result_cells(cohort: &Cohort) -> Vec<ResultCell> {
    let mut cells = Vec::with_capacity(cohort.samples.len() * cohort.regions.len());
    for (sample_index, sample) in cohort.samples.iter().enumerate() {
        for region in cohort.regions.iter() {
            let norm_depth = sample.norm_depth[region.index];
            let reference = sample.reference[region.index];
            let spread = sample.reference_spread[region.index];
            cells.push(ResultCell {
                sample_index,
                region_index: region.index,
                chrom_index: region.chrom_index,
                norm_depth,
                reference,
                z: get_z_score(norm_depth, reference, spread),
                copies: DEFAULT_COPY_NUMBER,
            });
        }
    }
    cells
}
