//! Track stats for the whole call run
//!

use std::fs::File;

use camino::Utf8Path;
use log::info;
use serde::{Deserialize, Serialize};
use unwrap::unwrap;

use crate::call_cnvs::{CallStats, CnvCallResult};
use crate::cohort::Cohort;
use crate::filenames::RUN_STATS_FILENAME;
use crate::stats_utils::mean;

#[derive(Default, Deserialize, Serialize)]
pub struct QcStats {
    pub total_region_count: usize,
    pub invalid_region_count: usize,
    pub total_sample_count: usize,
    pub invalid_sample_count: usize,

    /// Mean correlation of QC-passing samples to their synthetic reference
    pub mean_reference_correlation: f64,
}

#[derive(Default, Deserialize, Serialize)]
pub struct EventStats {
    pub cnv_event_count: usize,

    /// Total count of regions in all CNV events
    pub cnv_region_count: usize,

    pub mean_regions_per_event: f64,

    /// Mean CNV events per QC-passing sample, scaled to 100 QC-passing regions
    pub events_per_sample_per_100_regions: f64,
}

/// Runtime of each pipeline stage
#[derive(Default, Deserialize, Serialize)]
pub struct StageTimes {
    pub read_input_secs: f64,
    pub normalization_secs: f64,
    pub region_qc_secs: f64,
    pub peer_similarity_secs: f64,
    pub reference_secs: f64,
    pub sample_qc_secs: f64,
    pub cnv_calling_secs: f64,
    pub output_secs: f64,
}

#[derive(Default, Deserialize, Serialize)]
pub struct CallRunStats {
    pub qc_stats: QcStats,
    pub call_stats: CallStats,
    pub event_stats: EventStats,
    pub stage_times: StageTimes,
}

/// Summarize QC and CNV event statistics from a called cohort
pub fn get_call_run_stats(cohort: &Cohort, call_result: &CnvCallResult) -> CallRunStats {
    let passing_correlations = cohort
        .samples
        .iter()
        .map(|x| x.reference_correlation)
        .collect::<Vec<_>>();

    let qc_stats = QcStats {
        total_region_count: cohort.regions.len() + cohort.removed_regions.len(),
        invalid_region_count: cohort.removed_regions.len(),
        total_sample_count: cohort.samples.len() + cohort.removed_samples.len(),
        invalid_sample_count: cohort.removed_samples.len(),
        mean_reference_correlation: mean(&passing_correlations).unwrap_or(f64::NAN),
    };

    let cnv_event_count = call_result.ranges.len();
    let cnv_region_count = call_result.ranges.iter().map(|x| x.size()).sum::<usize>();
    let event_stats = EventStats {
        cnv_event_count,
        cnv_region_count,
        mean_regions_per_event: cnv_region_count as f64 / cnv_event_count as f64,
        events_per_sample_per_100_regions: cnv_event_count as f64
            / cohort.samples.len() as f64
            / (cohort.regions.len() as f64 / 100.0),
    };

    CallRunStats {
        qc_stats,
        call_stats: call_result.stats.clone(),
        event_stats,
        ..Default::default()
    }
}

/// Log the run statistics summary
pub fn log_call_run_stats(run_stats: &CallRunStats) {
    let qc = &run_stats.qc_stats;
    let events = &run_stats.event_stats;
    info!("Run statistics:");
    info!(
        "  invalid regions: {} of {}",
        qc.invalid_region_count, qc.total_region_count
    );
    info!(
        "  invalid samples: {} of {}",
        qc.invalid_sample_count, qc.total_sample_count
    );
    info!(
        "  mean correlation of samples to reference: {:.4}",
        qc.mean_reference_correlation
    );
    info!(
        "  number of CNV events: {} (consisting of {} regions)",
        events.cnv_event_count, events.cnv_region_count
    );
    info!(
        "  mean regions per CNV event: {:.2}",
        events.mean_regions_per_event
    );
    info!(
        "  CNV events per sample per 100 regions: {:.4}",
        events.events_per_sample_per_100_regions
    );
}

/// Write run_stats structure out in json format
pub fn write_call_run_stats(output_dir: &Utf8Path, run_stats: &CallRunStats) {
    let filename = output_dir.join(RUN_STATS_FILENAME);

    info!("Writing run statistics to file: '{filename}'");

    let f = unwrap!(
        File::create(&filename),
        "Unable to create run statistics json file: '{filename}'"
    );

    serde_json::to_writer_pretty(&f, &run_stats).unwrap();
}
