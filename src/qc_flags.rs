//! QC flags attached to samples and target regions
//!
//! A sample or region passes QC when it carries no flags. Flags render to the short text labels
//! used in the sample and region summary output.
//!

use std::fmt;

use itertools::Itertools;

/// Ordered list of QC failures for one sample or region
#[derive(Clone, Debug, PartialEq)]
pub struct QcFlags<T> {
    flags: Vec<T>,
}

impl<T> QcFlags<T> {
    pub fn new() -> Self {
        Self { flags: Vec::new() }
    }

    pub fn is_pass(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn push(&mut self, flag: T) {
        self.flags.push(flag);
    }

    pub fn clear(&mut self) {
        self.flags.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.flags.iter()
    }
}

impl<T> Default for QcFlags<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Display> fmt::Display for QcFlags<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.flags.iter().join(" "))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SampleQcFlag {
    /// Mean depth of the authoritative compartment is below the sample minimum
    LowDepth(f64),
    LowChrXDepth(f64),
    LowAutosomeDepth(f64),
    /// Correlation of normalized depth to the synthetic reference is too low
    LowReferenceCorrelation(f64),
}

impl fmt::Display for SampleQcFlag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::LowDepth(x) => write!(f, "avg_depth={x:.2}"),
            Self::LowChrXDepth(x) => write!(f, "avg_depth_chrx={x:.2}"),
            Self::LowAutosomeDepth(x) => write!(f, "avg_depth_autosomes={x:.2}"),
            Self::LowReferenceCorrelation(x) => write!(f, "corr={x:.3}"),
        }
    }
}

/// Region QC failures, each variant carries the threshold that was not met
#[derive(Clone, Debug, PartialEq)]
pub enum RegionQcFlag {
    LowNormalizedDepth(f64),
    LowDepth(f64),
    HighCoefficientOfVariation(f64),
    Excluded,
    ChrY,
}

impl fmt::Display for RegionQcFlag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::LowNormalizedDepth(x) => write!(f, "ncov<{x}"),
            Self::LowDepth(x) => write!(f, "cov<{x}"),
            Self::HighCoefficientOfVariation(x) => write!(f, "cv>{x}"),
            Self::Excluded => write!(f, "excluded"),
            Self::ChrY => write!(f, "chrY"),
        }
    }
}
