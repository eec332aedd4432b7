use super::cell_stats::ResultCell;
use super::{CnvRange, CnvType};

/// Test whether two ranges have the same type, sample and chromosome
fn is_mergeable_pair(cells: &[ResultCell], first: &CnvRange, second: &CnvRange) -> bool {
    first.cnv_type == second.cnv_type
        && first.sample_index == second.sample_index
        && cells[first.start].chrom_index == cells[second.start].chrom_index
}

/// Merge consecutive ranges whose cell spans are directly adjacent
///
/// Ranges are scanned from the end backward so that runs of adjacent ranges collapse into the
/// leftmost range of the run in one pass.
///
pub fn merge_adjacent_ranges(cells: &[ResultCell], ranges: &mut Vec<CnvRange>) {
    for range_index in (0..ranges.len().saturating_sub(1)).rev() {
        let (first, second) = (&ranges[range_index], &ranges[range_index + 1]);
        if first.end + 1 != second.start || !is_mergeable_pair(cells, first, second) {
            continue;
        }
        ranges[range_index].end = ranges[range_index + 1].end;
        ranges.remove(range_index + 1);
    }
}

/// Test whether any cell in the gap between two ranges has a z-score against the range trend
///
/// Undefined z-scores never contradict the trend.
///
fn is_contradicting_gap(cnv_type: CnvType, gap_cells: &[ResultCell]) -> bool {
    gap_cells.iter().any(|cell| match cnv_type {
        CnvType::Ins => cell.z < 0.0,
        CnvType::Del => cell.z > 0.0,
    })
}

/// Try one backward pass of gap bridging over all consecutive range pairs
///
/// Returns true if any ranges were merged.
///
fn merge_gapped_ranges_pass(
    ext_gap_span: f64,
    cells: &mut [ResultCell],
    ranges: &mut Vec<CnvRange>,
) -> bool {
    let mut is_merged = false;
    for range_index in (0..ranges.len().saturating_sub(1)).rev() {
        let (first, second) = (&ranges[range_index], &ranges[range_index + 1]);
        if !is_mergeable_pair(cells, first, second) {
            continue;
        }

        assert!(
            first.end < second.start,
            "Overlapping CNV ranges found at cells {} and {}",
            first.end,
            second.start
        );
        let gap_size = second.start - first.end - 1;
        let max_gap_size = ext_gap_span / 100.0 * (first.size() + second.size()) as f64;
        if gap_size as f64 > max_gap_size {
            continue;
        }

        let gap = (first.end + 1)..second.start;
        if is_contradicting_gap(first.cnv_type, &cells[gap.clone()]) {
            continue;
        }

        for cell in cells[gap].iter_mut() {
            cell.copies = cell.estimate_copies();
        }
        ranges[range_index].end = ranges[range_index + 1].end;
        ranges.remove(range_index + 1);
        is_merged = true;
    }
    is_merged
}

/// Bridge small gaps between consecutive ranges with a consistent trend
///
/// A gap can be bridged when it is no larger than `ext_gap_span` percent of the two ranges' total
/// size, and no gap cell's z-score contradicts the range trend. Copy number estimates are set on
/// all bridged gap cells. Passes repeat until no further merges are found.
///
pub fn merge_gapped_ranges(
    ext_gap_span: f64,
    cells: &mut [ResultCell],
    ranges: &mut Vec<CnvRange>,
) {
    while merge_gapped_ranges_pass(ext_gap_span, cells, ranges) {}
}

#[cfg(test)]
mod tests {
    use super::super::cell_stats::DEFAULT_COPY_NUMBER;
    use super::super::test_utils::get_test_cells;
    use super::*;

    fn get_range(sample_index: usize, start: usize, end: usize, cnv_type: CnvType) -> CnvRange {
        CnvRange {
            sample_index,
            start,
            end,
            cnv_type,
        }
    }

    #[test]
    fn test_merge_adjacent_ranges() {
        let cells = get_test_cells(&[vec![(1.0, 0.0); 6], vec![(1.0, 0.0); 2]]);
        let mut ranges = vec![
            get_range(0, 0, 0, CnvType::Del),
            get_range(0, 1, 2, CnvType::Del),
            get_range(0, 3, 3, CnvType::Del),
            get_range(0, 4, 4, CnvType::Ins),
            get_range(0, 5, 5, CnvType::Ins),
            get_range(1, 6, 6, CnvType::Ins),
        ];
        merge_adjacent_ranges(&cells, &mut ranges);
        assert_eq!(
            ranges,
            vec![
                get_range(0, 0, 3, CnvType::Del),
                get_range(0, 4, 5, CnvType::Ins),
                get_range(1, 6, 6, CnvType::Ins),
            ]
        );

        // A second pass finds nothing more to merge
        let merged_ranges = ranges.clone();
        merge_adjacent_ranges(&cells, &mut ranges);
        assert_eq!(ranges, merged_ranges);
    }

    #[test]
    fn test_merge_adjacent_ranges_chrom_boundary() {
        let mut cells = get_test_cells(&[vec![(1.0, 0.0); 2]]);
        cells[1].chrom_index = 1;
        let mut ranges = vec![
            get_range(0, 0, 0, CnvType::Del),
            get_range(0, 1, 1, CnvType::Del),
        ];
        merge_adjacent_ranges(&cells, &mut ranges);
        assert_eq!(ranges.len(), 2);
    }

    #[test]
    fn test_merge_gapped_ranges() {
        let mut cells = get_test_cells(&[vec![
            (0.5, -5.0),
            (0.5, -5.0),
            (0.9, -1.0),
            (0.5, -5.0),
            (0.5, -5.0),
            (0.5, -5.0),
        ]]);
        for cell in cells.iter_mut() {
            if cell.z < -4.0 {
                cell.copies = 1;
            }
        }
        let mut ranges = vec![
            get_range(0, 0, 1, CnvType::Del),
            get_range(0, 3, 5, CnvType::Del),
        ];
        merge_gapped_ranges(20.0, &mut cells, &mut ranges);
        assert_eq!(ranges, vec![get_range(0, 0, 5, CnvType::Del)]);
        assert_eq!(ranges[0].size(), 6);

        // Gap cell copy number is re-estimated on merge
        assert_eq!(cells[2].copies, DEFAULT_COPY_NUMBER);

        let merged_ranges = ranges.clone();
        merge_gapped_ranges(20.0, &mut cells, &mut ranges);
        assert_eq!(ranges, merged_ranges);
    }

    #[test]
    fn test_merge_gapped_ranges_repeats_to_fixed_point() {
        // The rightmost gap can only be bridged after the leftmost pair is merged
        let mut cells = get_test_cells(&[vec![(1.6, 5.0); 9]]);
        cells[5].z = 0.5;
        cells[7].z = 0.5;
        let mut ranges = vec![
            get_range(0, 0, 4, CnvType::Ins),
            get_range(0, 6, 6, CnvType::Ins),
            get_range(0, 8, 8, CnvType::Ins),
        ];
        merge_gapped_ranges(20.0, &mut cells, &mut ranges);
        assert_eq!(ranges, vec![get_range(0, 0, 8, CnvType::Ins)]);
        assert_eq!(cells[7].copies, 3);
    }

    #[test]
    fn test_merge_gapped_ranges_rejects() {
        let cells = get_test_cells(&[vec![(1.0, 0.0); 4], vec![(1.0, 0.0); 4]]);

        // Gap is too large
        let mut ranges = vec![
            get_range(0, 0, 0, CnvType::Del),
            get_range(0, 3, 3, CnvType::Del),
        ];
        let expected = ranges.clone();
        merge_gapped_ranges(20.0, &mut cells.clone(), &mut ranges);
        assert_eq!(ranges, expected);

        // Gap cell contradicts the trend
        let mut contradicting_cells = cells.clone();
        contradicting_cells[1].z = 0.5;
        let mut ranges = vec![
            get_range(0, 0, 0, CnvType::Del),
            get_range(0, 2, 3, CnvType::Del),
        ];
        let expected = ranges.clone();
        merge_gapped_ranges(100.0, &mut contradicting_cells, &mut ranges);
        assert_eq!(ranges, expected);

        // Differing type or sample
        let mut ranges = vec![
            get_range(0, 0, 1, CnvType::Del),
            get_range(0, 3, 3, CnvType::Ins),
            get_range(1, 5, 7, CnvType::Ins),
        ];
        let expected = ranges.clone();
        merge_gapped_ranges(100.0, &mut cells.clone(), &mut ranges);
        assert_eq!(ranges, expected);
    }
}
