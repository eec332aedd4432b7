use std::fs::File;
use std::io::{BufWriter, Write};

use camino::Utf8Path;
use log::info;
use unwrap::unwrap;

use crate::call_cnvs::CnvCallResult;
use crate::cohort::Cohort;
use crate::filenames::DEBUG_FILENAME;

/// Write statistics of every result cell for one sample, or for all samples if `sample_index` is
/// None
///
/// For a single sample, its peer similarity ranking is written first as '##' comment lines.
///
pub fn write_debug_table<W: Write>(
    f: &mut W,
    cohort: &Cohort,
    call_result: &CnvCallResult,
    sample_index: Option<usize>,
) {
    writeln!(
        f,
        "#sample\tregion\tcopy_number\tz_score\tndoc\tref_ndoc\tref_ndoc_stdev\tlog2_ratio"
    )
    .unwrap();

    if let Some(sample_index) = sample_index {
        let sample = &cohort.samples[sample_index];
        writeln!(f, "##correlation of {} to other samples:", sample.name).unwrap();
        for (rank, peer) in sample
            .peers
            .iter()
            .filter(|x| x.sample_id != sample.id)
            .enumerate()
        {
            writeln!(
                f,
                "##{}\t{}\t{:.4}",
                rank + 1,
                cohort.sample_names[peer.sample_id],
                peer.similarity
            )
            .unwrap();
        }
    }

    for cell in call_result.cells.iter() {
        if sample_index.is_some_and(|x| x != cell.sample_index) {
            continue;
        }
        let sample = &cohort.samples[cell.sample_index];
        let region = &cohort.regions[cell.region_index];
        writeln!(
            f,
            "{}\t{}\t{}\t{:.2}\t{:.3}\t{:.3}\t{:.3}\t{:.2}",
            sample.name,
            region.to_region_str(&cohort.chrom_list),
            cell.copies,
            cell.z,
            cell.norm_depth,
            cell.reference,
            sample.reference_spread[cell.region_index],
            (cell.norm_depth / cell.reference).log2()
        )
        .unwrap();
    }
}

pub fn write_debug_file(
    output_dir: &Utf8Path,
    cohort: &Cohort,
    call_result: &CnvCallResult,
    sample_index: Option<usize>,
) {
    let filename = output_dir.join(DEBUG_FILENAME);

    info!("Writing per-region debug output to file: '{filename}'");

    let f = unwrap!(
        File::create(&filename),
        "Unable to create debug output file: '{filename}'"
    );
    let mut f = BufWriter::new(f);
    write_debug_table(&mut f, cohort, call_result, sample_index);
}
