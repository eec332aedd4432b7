mod call;
mod shared;
mod utils;

use camino::Utf8Path;
use chrono::Datelike;
use clap::{Parser, Subcommand};
use simple_error::{SimpleResult, bail};

pub use self::call::{CallSettings, get_coverage_inputs, write_call_settings};
use self::call::validate_and_fix_call_settings;
use self::shared::validate_and_fix_shared_settings;
pub use self::shared::SharedSettings;

/// Default expression used to recognize autosome chromosome labels
pub const DEFAULT_AUTOSOME_REGEX: &str = r"^(chr)?\d{1,2}$";

#[derive(Subcommand)]
pub enum Commands {
    /// Call CNVs in a cohort of targeted sequencing samples, using a synthetic reference built
    /// from the most similar samples of the cohort
    Call(CallSettings),
}

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    after_help = format!("Copyright (C) 2004-{}     Pacific Biosciences of California, Inc.
This program comes with ABSOLUTELY NO WARRANTY; it is intended for
Research Use Only and not for use in diagnostic procedures.", chrono::Utc::now().year()),
    help_template = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}"
)]
#[clap(propagate_version = true, rename_all = "kebab_case")]
pub struct Settings {
    #[command(flatten)]
    pub shared: SharedSettings,

    #[command(subcommand)]
    pub command: Commands,
}

impl Settings {
    pub fn get_output_dir(&self) -> &Utf8Path {
        match &self.command {
            Commands::Call(x) => &x.output_dir,
        }
    }
}

/// Checks if a directory does not exist
///
pub fn check_novel_dirname(dirname: &Utf8Path, label: &str) -> SimpleResult<()> {
    if dirname.exists() {
        bail!("{} already exists: \"{}\"", label, dirname);
    }
    Ok(())
}

/// Validate settings and update parameters that can't be processed by clap
///
/// Assumes that the logger is not setup
///
fn validate_and_fix_settings_impl(mut settings: Settings) -> SimpleResult<Settings> {
    settings.shared = validate_and_fix_shared_settings(settings.shared)?;

    settings.command = match settings.command {
        Commands::Call(x) => {
            let x = validate_and_fix_call_settings(x)?;
            Commands::Call(x)
        }
    };

    Ok(settings)
}

/// Validate settings and update to parameters that can't be processed automatically by clap.
///
pub fn validate_and_fix_settings(settings: Settings) -> Settings {
    match validate_and_fix_settings_impl(settings) {
        Ok(x) => x,
        Err(msg) => {
            eprintln!("Invalid command-line setting: {}", msg);
            std::process::exit(exitcode::USAGE);
        }
    }
}

pub fn parse_settings() -> Settings {
    Settings::parse()
}
