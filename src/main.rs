mod call;
mod call_cnvs;
mod chrom_list;
mod cli;
mod cnv_output;
mod cohort;
mod coverage_input;
mod debug_output;
mod filenames;
mod gene_annotation;
mod genome_regions;
mod globals;
mod histogram;
mod input_utils;
mod log_utils;
mod logger;
mod normalize_depth;
mod peer_similarity;
mod qc_flags;
mod region_qc;
mod run_stats;
mod sample;
mod sample_qc;
mod stats_utils;
mod summary_output;
mod synthetic_reference;
mod target_region;

use std::{error, process};

use hhmmss::Hhmmss;
use itertools::Itertools;
use log::{error, info};

use crate::call::run_call;
use crate::cli::Commands;
use crate::globals::{PROGRAM_NAME, PROGRAM_VERSION};
use crate::logger::setup_output_dir_and_logger;

/// Run the selected command, logging the program banner and total runtime
fn run(settings: &cli::Settings) -> Result<(), Box<dyn error::Error>> {
    let start = std::time::Instant::now();
    let shared = &settings.shared;

    info!("Starting {PROGRAM_NAME} {PROGRAM_VERSION}");
    info!("cmdline: {}", std::env::args().join(" "));
    info!("Running on {} threads", shared.thread_count);

    let Commands::Call(call_settings) = &settings.command;
    run_call(shared, call_settings)?;

    info!(
        "{PROGRAM_NAME} completed. Total Runtime: {}",
        start.elapsed().hhmmssxxx()
    );
    Ok(())
}

fn main() {
    let settings = cli::validate_and_fix_settings(cli::parse_settings());

    // The output directory holds the log file, so it is created with the logger
    setup_output_dir_and_logger(
        settings.get_output_dir(),
        settings.shared.clobber,
        settings.shared.debug,
    );

    if let Err(err) = run(&settings) {
        error!("{err}");
        process::exit(2);
    }
}
