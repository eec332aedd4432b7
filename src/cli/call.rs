use std::collections::HashSet;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use const_format::concatcp;
use csv::{ReaderBuilder, Trim};
use log::info;
use serde::{Deserialize, Serialize};
use simple_error::{SimpleResult, bail, map_err_with};
use unwrap::unwrap;

use super::DEFAULT_AUTOSOME_REGEX;
use super::utils::{canonicalize_filename, check_optional_filename, check_required_filename};
use crate::call_cnvs::CallCnvSettings;
use crate::chrom_list::ChromClassifier;
use crate::coverage_input::CoverageInput;
use crate::filenames::SETTINGS_FILENAME;
use crate::normalize_depth::NormalizeSettings;
use crate::region_qc::RegionQcSettings;
use crate::sample_qc::SampleQcSettings;
use crate::synthetic_reference::ReferenceSettings;

#[derive(Args, Deserialize, Serialize)]
#[group(required = true, multiple = false)]
pub struct CoverageInputGroup {
    /// Target region coverage file of a reference-eligible sample. Can be specified multiple
    /// times to add all samples of the cohort.
    ///
    /// Each line of the tab-separated file gives 'chrom start end depth' for one target region.
    /// Files ending in '.gz' are decompressed automatically.
    ///
    #[arg(long, value_name = "FILE")]
    pub coverage: Vec<Utf8PathBuf>,

    /// File listing one reference-eligible coverage file path per line
    #[arg(long, value_name = "FILE")]
    pub coverage_list: Option<Utf8PathBuf>,
}

#[derive(Args, Deserialize, Serialize)]
pub struct CallSettings {
    /// Directory for all call command output (must not already exist)
    #[arg(long, value_name = "DIR", default_value = concatcp!(env!("CARGO_PKG_NAME"), "_call_output"))]
    pub output_dir: Utf8PathBuf,

    #[command(flatten)]
    pub coverage_input_group: CoverageInputGroup,

    /// Coverage file of a sample which is analyzed, but never used to build the reference of
    /// other samples. Can be specified multiple times.
    #[arg(long, value_name = "FILE")]
    pub noref_coverage: Vec<Utf8PathBuf>,

    /// Number of most similar samples used to build each synthetic reference
    #[arg(long, value_name = "N", default_value_t = 20)]
    pub neighbor_count: usize,

    /// Minimum absolute z-score for a region to seed a CNV
    #[arg(long, default_value_t = 4.0)]
    pub min_z: f64,

    /// Minimum absolute z-score for a region to extend a CNV seed
    #[arg(long, default_value_t = 2.0)]
    pub ext_min_z: f64,

    /// Maximum gap between two CNVs which can be bridged when merging, as a percentage of the
    /// total size of the two CNVs in regions. Set to 0 to disable gap bridging.
    #[arg(long, default_value_t = 20.0)]
    pub ext_gap_span: f64,

    /// Minimum mean depth of a sample
    #[arg(long, default_value_t = 40.0)]
    pub sam_min_depth: f64,

    /// Minimum correlation of a sample to its synthetic reference
    #[arg(long, default_value_t = 0.95)]
    pub sam_min_corr: f64,

    /// Approximate maximum number of regions used to compute sample similarity. Regions are
    /// subsampled at an even stride to meet this target.
    #[arg(long, default_value_t = 20000)]
    pub sam_corr_regs: usize,

    /// Minimum mean depth of a region over QC-passing samples
    #[arg(long, default_value_t = 20.0)]
    pub reg_min_cov: f64,

    /// Minimum median normalized depth of a region
    #[arg(long, default_value_t = 0.01)]
    pub reg_min_ncov: f64,

    /// Maximum coefficient of variation of a region's normalized depth
    #[arg(long, default_value_t = 0.3)]
    pub reg_max_cv: f64,

    /// Regions excluded from CNV calling, in BED format
    #[arg(long, value_name = "FILE")]
    pub exclude: Option<Utf8PathBuf>,

    /// Regex used to recognize autosome chromosome labels. Sex chromosomes are recognized
    /// independently of this setting.
    #[arg(long, value_name = "REGEX", default_value = DEFAULT_AUTOSOME_REGEX)]
    pub autosome_regex: String,

    /// Gene intervals with gene symbols in the 4th column, in BED format. If given, a gene
    /// annotation column is added to the CNV output.
    #[arg(long, value_name = "FILE")]
    pub gene_bed: Option<Utf8PathBuf>,

    /// Genes within this distance of a CNV region are added to its annotation
    #[arg(long, default_value_t = 20)]
    pub gene_flank: i64,

    /// Write the per-region statistics of one sample to the debug output file. Use 'ALL' to
    /// write all samples.
    #[arg(long, value_name = "NAME")]
    pub debug_sample: Option<String>,

    /// Write an IGV SEG track for one sample
    #[arg(long, value_name = "NAME")]
    pub seg_sample: Option<String>,
}

impl CallSettings {
    pub fn normalize_settings(&self) -> NormalizeSettings {
        NormalizeSettings {
            min_sample_depth: self.sam_min_depth,
        }
    }

    pub fn region_qc_settings(&self) -> RegionQcSettings {
        RegionQcSettings {
            min_norm_depth: self.reg_min_ncov,
            min_depth: self.reg_min_cov,
            max_cv: self.reg_max_cv,
        }
    }

    pub fn reference_settings(&self) -> ReferenceSettings {
        ReferenceSettings {
            neighbor_count: self.neighbor_count,
        }
    }

    pub fn sample_qc_settings(&self) -> SampleQcSettings {
        SampleQcSettings {
            min_reference_correlation: self.sam_min_corr,
        }
    }

    pub fn call_cnv_settings(&self) -> CallCnvSettings {
        CallCnvSettings {
            min_z: self.min_z,
            ext_min_z: self.ext_min_z,
            ext_gap_span: self.ext_gap_span,
            min_norm_depth: self.reg_min_ncov,
            min_depth: self.reg_min_cov,
        }
    }
}

/// Read coverage file paths from a list file
///
/// Blank lines and lines starting with '#' are skipped.
///
fn read_coverage_list(coverage_list: &Utf8Path) -> SimpleResult<Vec<Utf8PathBuf>> {
    check_required_filename(coverage_list, "coverage list")?;

    let mut rdr = map_err_with!(
        ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .comment(Some(b'#'))
            .delimiter(b'\t')
            .from_path(coverage_list),
        "Unable to open coverage list file: '{coverage_list}'"
    )?;

    let mut filenames = Vec::new();
    for (line_index, result) in rdr.records().enumerate() {
        let record = map_err_with!(
            result,
            "Failed to parse record {} from coverage list file: '{coverage_list}'",
            line_index + 1,
        )?;
        match record.get(0) {
            Some(x) if !x.is_empty() => filenames.push(Utf8PathBuf::from(x)),
            _ => {}
        }
    }

    if filenames.is_empty() {
        bail!("No coverage files found in coverage list file: '{coverage_list}'");
    }
    Ok(filenames)
}

/// Get all coverage inputs in input order, with reference-eligible inputs first
///
/// Assumes settings have been validated, so that any coverage list has already been expanded.
///
pub fn get_coverage_inputs(settings: &CallSettings) -> Vec<CoverageInput> {
    let to_input = |is_reference: bool| {
        move |filename: &Utf8PathBuf| CoverageInput {
            filename: filename.clone(),
            is_reference,
        }
    };
    settings
        .coverage_input_group
        .coverage
        .iter()
        .map(to_input(true))
        .chain(settings.noref_coverage.iter().map(to_input(false)))
        .collect()
}

/// Validate settings and update to parameters that can't be processed automatically by clap.
///
/// Assumes that the logger is not setup
///
pub fn validate_and_fix_call_settings(mut settings: CallSettings) -> SimpleResult<CallSettings> {
    if let Some(coverage_list) = &settings.coverage_input_group.coverage_list {
        settings.coverage_input_group.coverage = read_coverage_list(coverage_list)?;
    }

    let mut check_files = HashSet::new();
    for (filename, label) in settings
        .coverage_input_group
        .coverage
        .iter()
        .map(|x| (x, "coverage"))
        .chain(settings.noref_coverage.iter().map(|x| (x, "noref coverage")))
    {
        check_required_filename(filename, label)?;

        // The sample name is taken from the path as given, so only use the resolved path to find
        // duplicates
        if !check_files.insert(canonicalize_filename(filename)?) {
            bail!("Duplicated coverage input file: '{filename}'");
        }
    }

    check_optional_filename(settings.exclude.as_ref(), "excluded regions")?;
    check_optional_filename(settings.gene_bed.as_ref(), "gene annotation")?;

    if settings.neighbor_count == 0 {
        bail!("--neighbor-count argument must be greater than 0");
    }

    let reference_count = settings.coverage_input_group.coverage.len();
    if reference_count < settings.neighbor_count + 1 {
        bail!(
            "At least {} reference coverage files are required for --neighbor-count {}, but only {} were provided",
            settings.neighbor_count + 1,
            settings.neighbor_count,
            reference_count
        );
    }

    if settings.min_z <= 0.0 {
        bail!("--min-z argument must be greater than 0");
    }

    if settings.ext_min_z <= 0.0 {
        bail!("--ext-min-z argument must be greater than 0");
    }

    if settings.ext_gap_span < 0.0 {
        bail!("--ext-gap-span argument must not be negative");
    }

    if settings.sam_corr_regs == 0 {
        bail!("--sam-corr-regs argument must be greater than 0");
    }

    if settings.gene_flank < 0 {
        bail!("--gene-flank argument must not be negative");
    }

    ChromClassifier::new(&settings.autosome_regex)?;

    Ok(settings)
}

/// Write the validated call settings to the output directory in json format
pub fn write_call_settings(output_dir: &Utf8Path, settings: &CallSettings) {
    let filename = output_dir.join(SETTINGS_FILENAME);

    info!("Writing call settings to file: '{filename}'");

    let f = unwrap!(
        std::fs::File::create(&filename),
        "Unable to create call settings json file: '{filename}'"
    );

    serde_json::to_writer_pretty(&f, &settings).unwrap();
}
