//! Per-sample and per-region summary tables
//!

use std::fs::File;
use std::io::{BufWriter, Write};

use camino::Utf8Path;
use log::info;
use unwrap::unwrap;

use crate::call_cnvs::CnvCallResult;
use crate::cohort::Cohort;
use crate::filenames::{REGION_INFO_FILENAME, SAMPLE_INFO_FILENAME};
use crate::stats_utils::median;

/// Median absolute z-score of each QC-passing sample
///
/// Non-finite z-scores are skipped. Samples without any finite z-score get NaN.
///
pub fn get_sample_z_score_mads(cohort: &Cohort, call_result: &CnvCallResult) -> Vec<f64> {
    let mut sample_abs_z = vec![Vec::new(); cohort.samples.len()];
    for cell in call_result.cells.iter().filter(|x| x.z.is_finite()) {
        sample_abs_z[cell.sample_index].push(cell.z.abs());
    }
    sample_abs_z
        .into_iter()
        .map(|mut x| if x.is_empty() { f64::NAN } else { median(&mut x) })
        .collect()
}

/// Write the sample summary table, passing samples first followed by removed samples
pub fn write_sample_table<W: Write>(f: &mut W, cohort: &Cohort, call_result: &CnvCallResult) {
    writeln!(
        f,
        "#sample\tref_sample\tdoc_mean\tref_correl\tz_score_mad\tcnvs\tqc_info"
    )
    .unwrap();

    let yes_no = |x: bool| if x { "yes" } else { "no" };

    let z_score_mads = get_sample_z_score_mads(cohort, call_result);
    for (sample_index, sample) in cohort.samples.iter().enumerate() {
        writeln!(
            f,
            "{}\t{}\t{:.1}\t{:.3}\t{:.3}\t{}\t{}",
            sample.name,
            yes_no(sample.is_reference),
            sample.depth_mean,
            sample.reference_correlation,
            z_score_mads[sample_index],
            call_result.event_counts.sample[sample_index],
            sample.qc
        )
        .unwrap();
    }

    for sample in cohort.removed_samples.iter() {
        writeln!(
            f,
            "{}\t{}\t{:.1}\t{:.3}\t-\t-\t{}",
            sample.name,
            yes_no(sample.is_reference),
            sample.depth_mean,
            sample.reference_correlation,
            sample.qc
        )
        .unwrap();
    }
}

/// Write the region summary table, with passing and removed regions together in input order
pub fn write_region_table<W: Write>(f: &mut W, cohort: &Cohort, call_result: &CnvCallResult) {
    writeln!(
        f,
        "#region\tsize\tndoc_median\tndoc_mad\tndoc_cv\tcnvs\tqc_info"
    )
    .unwrap();

    let mut regions = cohort
        .regions
        .iter()
        .chain(cohort.removed_regions.iter())
        .collect::<Vec<_>>();
    regions.sort_by_key(|x| x.id);

    for region in regions {
        let event_count = if region.qc.is_pass() {
            call_result.event_counts.region[region.index].to_string()
        } else {
            "-".to_string()
        };
        writeln!(
            f,
            "{}\t{}\t{:.3}\t{:.3}\t{:.2}\t{}\t{}",
            region.to_region_str(&cohort.chrom_list),
            region.size(),
            region.median,
            region.mad,
            region.cv(),
            event_count,
            region.qc
        )
        .unwrap();
    }
}

pub fn write_sample_and_region_files(
    output_dir: &Utf8Path,
    cohort: &Cohort,
    call_result: &CnvCallResult,
) {
    let filename = output_dir.join(SAMPLE_INFO_FILENAME);
    info!("Writing sample summary to file: '{filename}'");
    let f = unwrap!(
        File::create(&filename),
        "Unable to create sample summary file: '{filename}'"
    );
    write_sample_table(&mut BufWriter::new(f), cohort, call_result);

    let filename = output_dir.join(REGION_INFO_FILENAME);
    info!("Writing region summary to file: '{filename}'");
    let f = unwrap!(
        File::create(&filename),
        "Unable to create region summary file: '{filename}'"
    );
    write_region_table(&mut BufWriter::new(f), cohort, call_result);
}
