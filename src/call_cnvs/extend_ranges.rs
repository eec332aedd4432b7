use super::cell_stats::{DEFAULT_COPY_NUMBER, ResultCell};
use super::{CallCnvSettings, CnvRange, CnvType};

/// Test whether `cell` continues the trend of a range, and if so return its copy number estimate
///
/// The cell must be untouched by any other range, and on the same sample and chromosome as the
/// range.
///
fn get_extension_copies(
    ext_min_z: f64,
    range: &CnvRange,
    range_chrom_index: usize,
    cell: &ResultCell,
) -> Option<u32> {
    if cell.copies != DEFAULT_COPY_NUMBER
        || cell.sample_index != range.sample_index
        || cell.chrom_index != range_chrom_index
    {
        return None;
    }

    let copies = cell.estimate_copies();
    let is_trend = match range.cnv_type {
        CnvType::Del => cell.z <= -ext_min_z && copies < DEFAULT_COPY_NUMBER,
        CnvType::Ins => cell.z >= ext_min_z && copies > DEFAULT_COPY_NUMBER,
    };
    if is_trend { Some(copies) } else { None }
}

/// Extend each range in both directions through adjacent cells with the same trend
///
/// Copy number estimates are set on all cells added to a range. Returns the total number of
/// cells added to all ranges.
///
pub fn extend_ranges(
    settings: &CallCnvSettings,
    cells: &mut [ResultCell],
    ranges: &mut [CnvRange],
) -> usize {
    let mut extended_cell_count = 0;
    for range in ranges.iter_mut() {
        let range_chrom_index = cells[range.start].chrom_index;

        // Extend left
        while range.start > 0 {
            let cell_index = range.start - 1;
            match get_extension_copies(
                settings.ext_min_z,
                range,
                range_chrom_index,
                &cells[cell_index],
            ) {
                Some(copies) => {
                    cells[cell_index].copies = copies;
                    range.start = cell_index;
                    extended_cell_count += 1;
                }
                None => break,
            }
        }

        // Extend right
        while range.end + 1 < cells.len() {
            let cell_index = range.end + 1;
            match get_extension_copies(
                settings.ext_min_z,
                range,
                range_chrom_index,
                &cells[cell_index],
            ) {
                Some(copies) => {
                    cells[cell_index].copies = copies;
                    range.end = cell_index;
                    extended_cell_count += 1;
                }
                None => break,
            }
        }
    }
    extended_cell_count
}
