use std::time::Instant;

use camino::Utf8Path;
use log::{debug, info, warn};
use simple_error::{SimpleResult, bail};

use crate::call_cnvs::call_cnvs;
use crate::chrom_list::ChromClassifier;
use crate::cli::{self, CallSettings, SharedSettings};
use crate::cnv_output::{GeneAnnotation, write_cnv_file, write_seg_file};
use crate::cohort::Cohort;
use crate::coverage_input::read_cohort_coverage;
use crate::debug_output::write_debug_file;
use crate::gene_annotation::BedGeneLookup;
use crate::genome_regions::GenomeRegions;
use crate::histogram::{
    log_reference_correlation_histogram, log_region_cv_histogram, log_sample_event_histogram,
    log_z_score_histogram,
};
use crate::log_utils::debug_msg;
use crate::normalize_depth::normalize_cohort_depth;
use crate::peer_similarity::{log_peer_rank_summary, rank_sample_peers};
use crate::region_qc::{get_mean_passing_sample_depth, run_region_qc};
use crate::run_stats::{get_call_run_stats, log_call_run_stats, write_call_run_stats};
use crate::sample_qc::run_sample_qc;
use crate::summary_output::write_sample_and_region_files;
use crate::synthetic_reference::build_synthetic_references;

/// Debug sample name used to select every sample for debug output
const ALL_SAMPLES_LABEL: &str = "ALL";

/// Check that an optional sample name given on the command line is found in the cohort
fn check_sample_name(cohort: &Cohort, name: Option<&str>, label: &str) -> SimpleResult<()> {
    match name {
        Some(name) if cohort.find_sample(name).is_none() => {
            bail!(
                "{label} sample '{name}' not found in input samples: {}",
                cohort.sample_names.join(", ")
            );
        }
        _ => Ok(()),
    }
}

/// Get the debug output sample selection as an index into the QC-passing samples
///
/// Returns None to select all samples. The cohort must already be compacted.
///
fn get_debug_sample_index(cohort: &Cohort, name: &str) -> SimpleResult<Option<usize>> {
    if name == ALL_SAMPLES_LABEL {
        return Ok(None);
    }
    match cohort.samples.iter().position(|x| x.name == name) {
        Some(x) => Ok(Some(x)),
        None => {
            let passing_names = cohort
                .samples
                .iter()
                .map(|x| x.name.as_str())
                .collect::<Vec<_>>();
            bail!(
                "Debug sample '{name}' failed QC. Valid debug samples are: {}",
                passing_names.join(", ")
            );
        }
    }
}

/// Log the reference summary of each sample, printing the traced debug sample unconditionally
fn log_sample_reference_summary(cohort: &Cohort, debug_sample: Option<&str>) {
    for sample in cohort.samples.iter() {
        let is_traced = debug_sample == Some(sample.name.as_str());
        let top_peer = sample
            .peers
            .iter()
            .find(|x| x.sample_id != sample.id)
            .map(|x| format!("{} ({:.4})", cohort.sample_names[x.sample_id], x.similarity))
            .unwrap_or_else(|| "-".to_string());
        debug_msg!(
            is_traced,
            "Sample '{}': mean depth {:.2} normalized depth stdev {:.4} most similar peer {} reference correlation {:.4} qc '{}'",
            sample.name,
            sample.depth_mean,
            sample.norm_depth_stdev,
            top_peer,
            sample.reference_correlation,
            sample.qc
        );
    }
}

fn elapsed_secs(start: Instant) -> f64 {
    start.elapsed().as_secs_f64()
}

/// Run the full CNV calling pipeline on one cohort and write all output files
///
pub fn run_call(shared_settings: &SharedSettings, settings: &CallSettings) -> SimpleResult<()> {
    let output_dir: &Utf8Path = &settings.output_dir;
    cli::write_call_settings(output_dir, settings);

    let debug_sample = settings.debug_sample.as_deref();
    let traced_sample = debug_sample.filter(|&x| x != ALL_SAMPLES_LABEL);

    let mut stage_start = Instant::now();
    let chrom_classifier = ChromClassifier::new(&settings.autosome_regex)?;
    let inputs = cli::get_coverage_inputs(settings);
    let mut cohort = read_cohort_coverage(&inputs, &chrom_classifier)?;
    check_sample_name(&cohort, traced_sample, "Debug")?;
    check_sample_name(&cohort, settings.seg_sample.as_deref(), "SEG")?;
    let read_input_secs = elapsed_secs(stage_start);

    stage_start = Instant::now();
    normalize_cohort_depth(&settings.normalize_settings(), &mut cohort);
    cohort.mean_sample_depth = match get_mean_passing_sample_depth(&cohort.samples) {
        Some(x) => x,
        None => {
            bail!("No samples pass depth QC");
        }
    };
    info!("Mean depth of QC-passing samples: {:.2}", cohort.mean_sample_depth);
    let normalization_secs = elapsed_secs(stage_start);

    stage_start = Instant::now();
    let excluded_regions = match &settings.exclude {
        Some(filename) => GenomeRegions::from_bed(filename, "excluded regions")?,
        None => GenomeRegions::new(),
    };
    run_region_qc(
        &settings.region_qc_settings(),
        &excluded_regions,
        &mut cohort,
    );
    log_region_cv_histogram(&cohort.regions);
    let region_qc_secs = elapsed_secs(stage_start);

    stage_start = Instant::now();
    rank_sample_peers(
        shared_settings.thread_count,
        settings.sam_corr_regs,
        &mut cohort.samples,
    );
    log_peer_rank_summary(&cohort.samples);
    let peer_similarity_secs = elapsed_secs(stage_start);

    stage_start = Instant::now();
    build_synthetic_references(
        shared_settings.thread_count,
        &settings.reference_settings(),
        &cohort.regions,
        &mut cohort.samples,
    );
    let reference_secs = elapsed_secs(stage_start);

    stage_start = Instant::now();
    run_sample_qc(&settings.sample_qc_settings(), &mut cohort.samples);
    log_reference_correlation_histogram(&cohort.samples);
    log_sample_reference_summary(&cohort, traced_sample);
    cohort.compact();
    if cohort.samples.is_empty() {
        bail!("No samples pass QC");
    }
    if cohort.regions.is_empty() {
        bail!("No regions pass QC");
    }
    let sample_qc_secs = elapsed_secs(stage_start);

    stage_start = Instant::now();
    let call_result = call_cnvs(&settings.call_cnv_settings(), &cohort);
    for seed in call_result.inconsistent_seeds.iter() {
        debug!(
            "Inconsistent seed in sample '{}' at region {} with z-score {:.2}",
            cohort.samples[seed.sample_index].name,
            cohort.regions[seed.region_index].to_region_str(&cohort.chrom_list),
            seed.z
        );
    }
    log_z_score_histogram(&call_result.cells);
    log_sample_event_histogram(&call_result.event_counts.sample);
    let cnv_calling_secs = elapsed_secs(stage_start);

    stage_start = Instant::now();
    let gene_lookup = match &settings.gene_bed {
        Some(filename) => Some(BedGeneLookup::from_bed(filename)?),
        None => None,
    };
    let gene_annotation = gene_lookup.as_ref().map(|x| GeneAnnotation {
        lookup: x,
        flank: settings.gene_flank,
    });
    write_cnv_file(output_dir, &cohort, &call_result, gene_annotation.as_ref());
    write_sample_and_region_files(output_dir, &cohort, &call_result);

    if let Some(name) = debug_sample {
        let sample_index = get_debug_sample_index(&cohort, name)?;
        write_debug_file(output_dir, &cohort, &call_result, sample_index);
    }

    if let Some(name) = &settings.seg_sample {
        match cohort.samples.iter().position(|x| &x.name == name) {
            Some(sample_index) => write_seg_file(output_dir, &cohort, &call_result, sample_index),
            None => warn!("SEG sample '{name}' failed QC, skipping SEG track output"),
        }
    }
    let output_secs = elapsed_secs(stage_start);

    let mut run_stats = get_call_run_stats(&cohort, &call_result);
    let stage_times = &mut run_stats.stage_times;
    stage_times.read_input_secs = read_input_secs;
    stage_times.normalization_secs = normalization_secs;
    stage_times.region_qc_secs = region_qc_secs;
    stage_times.peer_similarity_secs = peer_similarity_secs;
    stage_times.reference_secs = reference_secs;
    stage_times.sample_qc_secs = sample_qc_secs;
    stage_times.cnv_calling_secs = cnv_calling_secs;
    stage_times.output_secs = output_secs;

    log_call_run_stats(&run_stats);
    write_call_run_stats(output_dir, &run_stats);

    Ok(())
}
