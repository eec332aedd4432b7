//! Setup for the shoal logger and the output directory holding its log file
//!

use camino::Utf8Path;

use crate::cli;
use crate::globals::PROGRAM_NAME;

/// Create the output directory if it does not exist already
///
/// Panics when the directory can't be created. No logger is available yet so the error can only
/// be reported by the panic message.
///
fn create_output_dir(output_dir: &Utf8Path) {
    if output_dir.is_dir() {
        return;
    }
    if let Err(e) = std::fs::create_dir_all(output_dir) {
        panic!("Can't create new output directory at '{output_dir}': {e}");
    }
}

/// Log to stderr and to a log file in the output directory
///
/// If debug is true set the logger to the more verbose debug level
///
fn setup_logger(output_dir: &Utf8Path, debug: bool) -> Result<(), fern::InitError> {
    let level = if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    let log_filename = output_dir.join(format!("{PROGRAM_NAME}.log"));

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                PROGRAM_NAME,
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .chain(fern::log_file(log_filename)?)
        .apply()?;
    Ok(())
}

/// Check and create output directory, then setup logger to write there
///
/// An existing output directory is only reused when `clobber` is set.
///
pub fn setup_output_dir_and_logger(output_dir: &Utf8Path, clobber: bool, debug: bool) {
    // No logger is setup yet, so errors follow the pattern of the command-line validation methods
    if let Err(msg) = cli::check_novel_dirname(output_dir, "Output directory") {
        if !(clobber && output_dir.is_dir()) {
            eprintln!("Invalid command-line setting: {msg}");
            std::process::exit(exitcode::USAGE);
        }
    };
    create_output_dir(output_dir);
    setup_logger(output_dir, debug).unwrap();
}
