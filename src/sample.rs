use crate::qc_flags::{QcFlags, SampleQcFlag};

/// Similarity value given to the sample itself and to peers which can't be used as reference
pub const SENTINEL_SIMILARITY: f64 = -1.0;

/// Similarity of one peer sample to the owning sample
#[derive(Clone, Debug)]
pub struct PeerSimilarity {
    /// Input-order id of the peer sample
    pub sample_id: usize,

    pub similarity: f64,

    /// False for the sample itself and for peers which are not reference-eligible
    pub is_reference_peer: bool,
}

/// All depth, reference and QC data for one sample of the cohort
///
#[derive(Clone, Debug)]
pub struct SampleData {
    /// Position of this sample in the input list. This never changes, including when QC-failing
    /// samples are removed.
    pub id: usize,

    pub name: String,

    /// If false, the sample is analyzed but never used to build the reference of other samples
    pub is_reference: bool,

    /// Raw depth for each target region
    pub depth: Vec<f64>,

    /// Depth normalized by the compartment mean, indexed in the same way as `depth`
    pub norm_depth: Vec<f64>,

    /// Authoritative compartment mean depth before normalization
    pub depth_mean: f64,

    /// Deviation of normalized depth around 1.0
    pub norm_depth_stdev: f64,

    /// All other samples of the cohort, sorted by descending similarity
    pub peers: Vec<PeerSimilarity>,

    /// Synthetic reference normalized depth for each target region
    pub reference: Vec<f64>,

    /// Spread of the synthetic reference for each target region
    pub reference_spread: Vec<f64>,

    /// Correlation of normalized depth to the synthetic reference
    pub reference_correlation: f64,

    pub qc: QcFlags<SampleQcFlag>,
}

impl SampleData {
    pub fn new(id: usize, name: &str, is_reference: bool, depth: Vec<f64>) -> Self {
        Self {
            id,
            name: name.to_string(),
            is_reference,
            depth,
            norm_depth: Vec::new(),
            depth_mean: 0.0,
            norm_depth_stdev: 0.0,
            peers: Vec::new(),
            reference: Vec::new(),
            reference_spread: Vec::new(),
            reference_correlation: 0.0,
            qc: QcFlags::new(),
        }
    }

    pub fn region_count(&self) -> usize {
        self.depth.len()
    }
}
