use std::collections::HashMap;

use bio::data_structures::interval_tree::IntervalTree;
use camino::Utf8Path;
use log::info;
use simple_error::{SimpleResult, bail};

use crate::input_utils::{parse_coordinate, read_data_lines};

/// A set of chromosome regions which can be efficiently queried
///
/// Regions are stored as closed intervals [start, end].
///
#[derive(Clone)]
pub struct ChromRegions {
    regions: IntervalTree<i64, ()>,
}

impl ChromRegions {
    pub fn new() -> Self {
        Self {
            regions: IntervalTree::new(),
        }
    }

    /// Return true if the closed range [start, end] intersects with any regions stored in this object
    ///
    pub fn intersect(&self, start: i64, end: i64) -> bool {
        self.regions.find(start..end + 1).next().is_some()
    }

    /// Add closed region [start, end]
    ///
    /// Regions are not collapsed
    ///
    pub fn add_region(&mut self, start: i64, end: i64) {
        self.regions.insert(start..end + 1, ());
    }
}

#[derive(Clone, Default)]
pub struct GenomeRegions {
    pub chroms: HashMap<String, ChromRegions>,
}

impl GenomeRegions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create new object from bed file
    ///
    /// Each zero-indexed half-open bed interval [s, e) is stored as the closed interval [s+1, e]
    ///
    /// # Arguments
    ///
    /// * `label` - Used in log and error messages to describe what type of regions file this is
    ///
    pub fn from_bed(filename: &Utf8Path, label: &str) -> SimpleResult<Self> {
        info!("Reading {label} regions from file '{filename}'");

        let mut regions = GenomeRegions::new();
        for (line_number, line) in read_data_lines(filename, label)? {
            let words = line.split('\t').collect::<Vec<_>>();
            if words.len() < 3 {
                bail!(
                    "Expected at least 3 columns in {} regions file '{}' at line {}",
                    label,
                    filename,
                    line_number
                );
            }
            let chrom = words[0];
            let start = parse_coordinate(words[1], "start", filename, line_number)?;
            let end = parse_coordinate(words[2], "end", filename, line_number)?;
            if end <= start {
                bail!(
                    "Empty or inverted interval in {} regions file '{}' at line {}",
                    label,
                    filename,
                    line_number
                );
            }
            regions.add_region(chrom, start + 1, end);
        }

        Ok(regions)
    }

    /// Add the closed region [start, end]
    pub fn add_region(&mut self, chrom: &str, start: i64, end: i64) {
        self.chroms
            .entry(chrom.to_owned())
            .or_insert_with(ChromRegions::new)
            .add_region(start, end);
    }

    /// Return true if the closed region [start, end] overlaps any stored region
    pub fn intersect(&self, chrom: &str, start: i64, end: i64) -> bool {
        match self.chroms.get(chrom) {
            Some(chrom_regions) => chrom_regions.intersect(start, end),
            None => false,
        }
    }
}
