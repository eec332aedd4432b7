use std::collections::HashMap;

use regex::{Regex, RegexBuilder};
use simple_error::{SimpleResult, map_err_with};

/// Chromosome compartments used for depth normalization and region QC
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChromType {
    Autosome,
    X,
    Y,
    /// Unplaced contigs, mitochondria, etc.
    Other,
}

#[derive(Clone, Debug)]
pub struct ChromInfo {
    pub label: String,
    pub chrom_type: ChromType,
}

/// Chromosomes in the order they are first observed in the region registry
#[derive(Clone, Debug, Default)]
pub struct ChromList {
    pub data: Vec<ChromInfo>,
    pub label_to_index: HashMap<String, usize>,
}

impl ChromList {
    /// Add a new chromosome and return its index
    ///
    /// Panics if the chromosome label is already present
    ///
    pub fn add_chrom(&mut self, label: &str, chrom_type: ChromType) -> usize {
        let chrom_index = self.data.len();
        let prev = self.label_to_index.insert(label.to_string(), chrom_index);
        assert!(prev.is_none(), "Duplicate chromosome label '{label}'");
        self.data.push(ChromInfo {
            label: label.to_string(),
            chrom_type,
        });
        chrom_index
    }

    pub fn label(&self, chrom_index: usize) -> &str {
        &self.data[chrom_index].label
    }

    pub fn chrom_type(&self, chrom_index: usize) -> ChromType {
        self.data[chrom_index].chrom_type
    }
}

/// Assigns a ChromType to chromosome labels
///
pub struct ChromClassifier {
    autosome_regex: Regex,
    x_regex: Regex,
    y_regex: Regex,
}

impl ChromClassifier {
    /// # Arguments
    /// * `autosome_regex` - Chromosome labels matching this expression are treated as autosomes
    ///
    pub fn new(autosome_regex: &str) -> SimpleResult<Self> {
        let autosome_regex = map_err_with!(
            Regex::new(autosome_regex),
            "Invalid autosome chromosome regex"
        )?;
        let build_sex_chrom_regex = |pattern: &str| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .unwrap()
        };
        Ok(Self {
            autosome_regex,
            x_regex: build_sex_chrom_regex(r"^(chr)?X$"),
            y_regex: build_sex_chrom_regex(r"^(chr)?Y$"),
        })
    }

    pub fn classify(&self, label: &str) -> ChromType {
        if self.x_regex.is_match(label) {
            ChromType::X
        } else if self.y_regex.is_match(label) {
            ChromType::Y
        } else if self.autosome_regex.is_match(label) {
            ChromType::Autosome
        } else {
            ChromType::Other
        }
    }
}

impl Default for ChromClassifier {
    fn default() -> Self {
        Self::new(crate::cli::DEFAULT_AUTOSOME_REGEX).unwrap()
    }
}
