//! Names of all files written to the output directory
//!

pub const SETTINGS_FILENAME: &str = "call.settings.json";
pub const CNV_FILENAME: &str = "cnvs.tsv";
pub const SAMPLE_INFO_FILENAME: &str = "samples.tsv";
pub const REGION_INFO_FILENAME: &str = "regions.tsv";
pub const DEBUG_FILENAME: &str = "debug.tsv";
pub const RUN_STATS_FILENAME: &str = "run.stats.json";

/// Appended to the sample name to form the SEG track filename
pub const SEG_FILENAME_SUFFIX: &str = ".seg";
