use std::collections::HashSet;

use camino::{Utf8Path, Utf8PathBuf};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::info;
use simple_error::{SimpleResult, bail, try_with};
use thousands::Separable;

use crate::chrom_list::{ChromClassifier, ChromList};
use crate::cohort::Cohort;
use crate::input_utils::{open_text_file, parse_coordinate};
use crate::sample::SampleData;
use crate::target_region::TargetRegion;

/// One per-sample coverage file given on the command-line
#[derive(Clone, Debug)]
pub struct CoverageInput {
    pub filename: Utf8PathBuf,

    /// If false, the sample is analyzed but never used as a reference peer
    pub is_reference: bool,
}

struct CoverageRecord {
    line_number: u64,
    chrom: String,
    start: i64,
    end: i64,
    depth: f64,
}

/// Sample name derived from the coverage filename, everything up to the first '.'
pub fn get_sample_name(filename: &Utf8Path) -> String {
    let file_name = filename.file_name().unwrap_or(filename.as_str());
    match file_name.split_once('.') {
        Some((prefix, _)) => prefix.to_string(),
        None => file_name.to_string(),
    }
}

fn parse_coverage_record(
    filename: &Utf8Path,
    record: &StringRecord,
) -> SimpleResult<CoverageRecord> {
    let line_number = record.position().map_or(0, |x| x.line());
    if record.len() < 4 {
        bail!(
            "Expected at least 4 columns in coverage file '{}' at line {}",
            filename,
            line_number
        );
    }
    let line_index = line_number as usize;
    let start = parse_coordinate(&record[1], "start", filename, line_index)?;
    let end = parse_coordinate(&record[2], "end", filename, line_index)?;
    let depth = try_with!(
        record[3].parse::<f64>(),
        "Invalid depth value '{}' in coverage file '{}' at line {}",
        &record[3],
        filename,
        line_number
    );
    if !depth.is_finite() || depth < 0.0 {
        bail!(
            "Depth value '{}' in coverage file '{}' at line {} is not a finite non-negative number",
            &record[3],
            filename,
            line_number
        );
    }
    Ok(CoverageRecord {
        line_number,
        chrom: record[0].to_string(),
        start,
        end,
        depth,
    })
}

/// Read all coverage records from a tab-delimited file with columns 'chrom start end depth'
///
/// Additional columns are ignored. Lines starting with '#' are treated as comments.
///
fn read_coverage_records(filename: &Utf8Path) -> SimpleResult<Vec<CoverageRecord>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .comment(Some(b'#'))
        .delimiter(b'\t')
        .from_reader(open_text_file(filename, "coverage")?);

    let mut records = Vec::new();
    for (record_index, result) in rdr.records().enumerate() {
        let record = try_with!(
            result,
            "Failed to parse record {} from coverage file: '{}'",
            record_index + 1,
            filename
        );
        records.push(parse_coverage_record(filename, &record)?);
    }

    if records.is_empty() {
        bail!("No target regions found in coverage file: '{}'", filename);
    }
    Ok(records)
}

/// Build the target region registry from the records of the first coverage file
///
/// Each chromosome must form a single contiguous block, and region starts must be sorted within
/// each chromosome.
///
fn build_region_registry(
    filename: &Utf8Path,
    records: &[CoverageRecord],
    chrom_classifier: &ChromClassifier,
) -> SimpleResult<(ChromList, Vec<TargetRegion>)> {
    let mut chrom_list = ChromList::default();
    let mut regions: Vec<TargetRegion> = Vec::with_capacity(records.len());

    for (region_id, record) in records.iter().enumerate() {
        if record.end < record.start {
            bail!(
                "Region end precedes start in coverage file '{}' at line {}",
                filename,
                record.line_number
            );
        }

        let chrom_index = match regions.last() {
            Some(last) if chrom_list.label(last.chrom_index) == record.chrom => {
                if record.start < last.start {
                    bail!(
                        "Regions are not sorted by start position in coverage file '{}' at line {}",
                        filename,
                        record.line_number
                    );
                }
                last.chrom_index
            }
            _ => {
                if chrom_list.label_to_index.contains_key(&record.chrom) {
                    bail!(
                        "Regions on chromosome '{}' are not contiguous in coverage file '{}' at line {}",
                        record.chrom,
                        filename,
                        record.line_number
                    );
                }
                chrom_list.add_chrom(&record.chrom, chrom_classifier.classify(&record.chrom))
            }
        };

        regions.push(TargetRegion::new(
            region_id,
            chrom_index,
            record.start,
            record.end,
        ));
    }

    Ok((chrom_list, regions))
}

/// Check that a sample's coverage records list exactly the registry regions, and return the depth
/// vector
///
fn get_registry_depth(
    filename: &Utf8Path,
    records: Vec<CoverageRecord>,
    chrom_list: &ChromList,
    regions: &[TargetRegion],
) -> SimpleResult<Vec<f64>> {
    if records.len() != regions.len() {
        bail!(
            "Coverage file '{}' contains {} regions, but {} regions are expected",
            filename,
            records.len(),
            regions.len()
        );
    }

    let mut depth = Vec::with_capacity(records.len());
    for (record, region) in records.into_iter().zip(regions.iter()) {
        if record.chrom != chrom_list.label(region.chrom_index)
            || record.start != region.start
            || record.end != region.end
        {
            bail!(
                "Coverage file '{}' contains different regions than the first reference coverage file. Expected {}, got {}:{}-{} at line {}",
                filename,
                region.to_region_str(chrom_list),
                record.chrom,
                record.start,
                record.end,
                record.line_number
            );
        }
        depth.push(record.depth);
    }
    Ok(depth)
}

/// Read all sample coverage files into a new cohort
///
/// The first reference-eligible input defines the target region registry, all other inputs must
/// match it exactly.
///
pub fn read_cohort_coverage(
    inputs: &[CoverageInput],
    chrom_classifier: &ChromClassifier,
) -> SimpleResult<Cohort> {
    let first_input = match inputs.iter().find(|x| x.is_reference) {
        Some(x) => x,
        None => {
            bail!("At least one reference-eligible coverage file is required");
        }
    };

    info!(
        "Reading target regions from coverage file '{}'",
        first_input.filename
    );
    let (chrom_list, regions) = build_region_registry(
        &first_input.filename,
        &read_coverage_records(&first_input.filename)?,
        chrom_classifier,
    )?;
    info!(
        "Found {} target regions on {} chromosomes",
        regions.len().separate_with_commas(),
        chrom_list.data.len()
    );

    let mut sample_names = HashSet::new();
    let mut samples = Vec::with_capacity(inputs.len());
    for (sample_id, input) in inputs.iter().enumerate() {
        let name = get_sample_name(&input.filename);
        if !sample_names.insert(name.clone()) {
            bail!(
                "Duplicate sample name '{}' from coverage file '{}'",
                name,
                input.filename
            );
        }

        let records = read_coverage_records(&input.filename)?;
        let depth = get_registry_depth(&input.filename, records, &chrom_list, &regions)?;
        samples.push(SampleData::new(sample_id, &name, input.is_reference, depth));
    }

    info!(
        "Read coverage for {} samples ({} reference-eligible)",
        samples.len(),
        samples.iter().filter(|x| x.is_reference).count()
    );

    Ok(Cohort::new(chrom_list, regions, samples))
}
