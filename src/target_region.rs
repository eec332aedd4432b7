use crate::chrom_list::ChromList;
use crate::qc_flags::{QcFlags, RegionQcFlag};

/// One interval of the target region registry shared by all samples
///
/// Coordinates are taken as-is from the coverage input and treated as the closed interval
/// [start, end].
///
#[derive(Clone, Debug)]
pub struct TargetRegion {
    /// Position of this region in the coverage input. This never changes.
    pub id: usize,

    /// Dense index into all per-sample depth vectors. This is renumbered when QC-failing regions
    /// are removed.
    pub index: usize,

    pub chrom_index: usize,
    pub start: i64,
    pub end: i64,

    /// Median normalized depth over QC-passing samples
    pub median: f64,

    /// Scaled MAD of normalized depth over QC-passing samples
    pub mad: f64,

    pub qc: QcFlags<RegionQcFlag>,
}

impl TargetRegion {
    pub fn new(id: usize, chrom_index: usize, start: i64, end: i64) -> Self {
        Self {
            id,
            index: id,
            chrom_index,
            start,
            end,
            median: 0.0,
            mad: 0.0,
            qc: QcFlags::new(),
        }
    }

    /// Length of the closed region, used to weight depth values during normalization
    pub fn size(&self) -> i64 {
        self.end - self.start + 1
    }

    /// Coefficient of variation of the normalized depth
    pub fn cv(&self) -> f64 {
        self.mad / self.median
    }

    /// Region string in the format 'chr1:100-200'
    pub fn to_region_str(&self, chrom_list: &ChromList) -> String {
        format!(
            "{}:{}-{}",
            chrom_list.label(self.chrom_index),
            self.start,
            self.end
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chrom_list::ChromType;

    #[test]
    fn test_region_str() {
        let mut chrom_list = ChromList::default();
        chrom_list.add_chrom("chr7", ChromType::Autosome);
        let region = TargetRegion::new(3, 0, 1000, 1200);
        assert_eq!(region.to_region_str(&chrom_list), "chr7:1000-1200");
        assert_eq!(region.size(), 201);
        assert_eq!(region.index, 3);
    }
}
