//! Gene symbol annotation of CNV regions
//!

use std::collections::{BTreeSet, HashMap};

use bio::data_structures::interval_tree::IntervalTree;
use camino::Utf8Path;
use log::info;
use simple_error::{SimpleResult, bail};

use crate::input_utils::{parse_coordinate, read_data_lines};

/// Source of gene symbols overlapping a genomic interval
pub trait GeneLookup {
    /// Find the symbols of all genes overlapping the closed interval [start - flank, end + flank]
    fn genes_overlapping(&self, chrom: &str, start: i64, end: i64, flank: i64) -> Vec<String>;
}

/// Gene lookup built from a BED file with gene symbols in the 4th column
#[derive(Default)]
pub struct BedGeneLookup {
    chroms: HashMap<String, IntervalTree<i64, String>>,
}

impl BedGeneLookup {
    /// Each zero-indexed half-open bed interval [s, e) is stored as the closed interval [s+1, e]
    pub fn from_bed(filename: &Utf8Path) -> SimpleResult<Self> {
        let label = "gene annotation";
        info!("Reading {label} from file '{filename}'");

        let mut lookup = Self::default();
        let mut gene_count = 0;
        for (line_number, line) in read_data_lines(filename, label)? {
            let words = line.split('\t').collect::<Vec<_>>();
            if words.len() < 4 {
                bail!(
                    "Expected at least 4 columns in {} file '{}' at line {}",
                    label,
                    filename,
                    line_number
                );
            }
            let start = parse_coordinate(words[1], "start", filename, line_number)?;
            let end = parse_coordinate(words[2], "end", filename, line_number)?;
            if end <= start {
                bail!(
                    "Empty or inverted interval in {} file '{}' at line {}",
                    label,
                    filename,
                    line_number
                );
            }
            lookup.add_gene(words[0], start + 1, end, words[3].trim());
            gene_count += 1;
        }
        info!("Read {gene_count} gene intervals");

        Ok(lookup)
    }

    /// Add gene over the closed interval [start, end]
    pub fn add_gene(&mut self, chrom: &str, start: i64, end: i64, symbol: &str) {
        self.chroms
            .entry(chrom.to_owned())
            .or_insert_with(IntervalTree::new)
            .insert(start..end + 1, symbol.to_owned());
    }
}

impl GeneLookup for BedGeneLookup {
    fn genes_overlapping(&self, chrom: &str, start: i64, end: i64, flank: i64) -> Vec<String> {
        let Some(genes) = self.chroms.get(chrom) else {
            return Vec::new();
        };
        genes
            .find((start - flank)..(end + flank + 1))
            .map(|x| x.data().clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Memoized gene lookup keyed on region coordinates
///
/// The cache is intended to live for the duration of one output file write.
///
pub struct GeneAnnotationCache<'a> {
    lookup: &'a dyn GeneLookup,
    flank: i64,
    cache: HashMap<String, Vec<String>>,
}

impl<'a> GeneAnnotationCache<'a> {
    pub fn new(lookup: &'a dyn GeneLookup, flank: i64) -> Self {
        Self {
            lookup,
            flank,
            cache: HashMap::new(),
        }
    }

    /// Get gene symbols overlapping the given region
    ///
    /// `region_str` must uniquely describe the (chrom, start, end) coordinates.
    ///
    pub fn get_genes(
        &mut self,
        region_str: &str,
        chrom: &str,
        start: i64,
        end: i64,
    ) -> &[String] {
        if !self.cache.contains_key(region_str) {
            let genes = self
                .lookup
                .genes_overlapping(chrom, start, end, self.flank);
            self.cache.insert(region_str.to_owned(), genes);
        }
        &self.cache[region_str]
    }
}
