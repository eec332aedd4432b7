use log::warn;

use super::cell_stats::{DEFAULT_COPY_NUMBER, ResultCell};
use super::{CallCnvSettings, CnvRange, CnvType, InconsistentSeed};

/// Normalized depth ratio to the reference below which a cell is treated as a homozygous deletion
/// seed
const HOMOZYGOUS_DELETION_RATIO: f64 = 0.1;

/// Test whether a cell triggers a CNV seed
///
/// A cell seeds either from its z-score, or when a well-covered reference region has almost no
/// depth in the sample. The latter catches homozygous deletions whose z-score is limited by
/// the clamp.
///
fn is_seed_cell(settings: &CallCnvSettings, mean_sample_depth: f64, cell: &ResultCell) -> bool {
    if cell.z.abs() >= settings.min_z {
        return true;
    }
    cell.reference >= settings.min_norm_depth
        && cell.reference * mean_sample_depth >= settings.min_depth
        && cell.norm_depth < HOMOZYGOUS_DELETION_RATIO * cell.reference
}

/// Find all single-cell CNV seed ranges
///
/// Seed cells have their copy number estimate set. Seed cells whose copy number estimate is the
/// default are returned as inconsistent seeds instead of ranges.
///
pub fn get_seed_ranges(
    settings: &CallCnvSettings,
    mean_sample_depth: f64,
    cells: &mut [ResultCell],
) -> (Vec<CnvRange>, Vec<InconsistentSeed>) {
    let mut ranges = Vec::new();
    let mut inconsistent_seeds = Vec::new();
    for (cell_index, cell) in cells.iter_mut().enumerate() {
        if !is_seed_cell(settings, mean_sample_depth, cell) {
            continue;
        }

        cell.copies = cell.estimate_copies();
        if cell.copies == DEFAULT_COPY_NUMBER {
            warn!(
                "Found z-score outlier ({:.2}) with estimated copy number equal to {}",
                cell.z, DEFAULT_COPY_NUMBER
            );
            inconsistent_seeds.push(InconsistentSeed {
                sample_index: cell.sample_index,
                region_index: cell.region_index,
                z: cell.z,
            });
        } else {
            let cnv_type = if cell.copies < DEFAULT_COPY_NUMBER {
                CnvType::Del
            } else {
                CnvType::Ins
            };
            ranges.push(CnvRange {
                sample_index: cell.sample_index,
                start: cell_index,
                end: cell_index,
                cnv_type,
            });
        }
    }
    (ranges, inconsistent_seeds)
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::get_test_cells;
    use super::*;

    #[test]
    fn test_z_score_seeds() {
        let settings = CallCnvSettings::default();
        let mut cells = get_test_cells(&[vec![
            (1.5, 5.2),
            (1.5, 4.8),
            (1.0, 0.1),
            (1.0, -0.2),
            (1.0, 0.3),
        ]]);
        let (ranges, inconsistent_seeds) = get_seed_ranges(&settings, 100.0, &mut cells);

        assert!(inconsistent_seeds.is_empty());
        assert_eq!(ranges.len(), 2);
        assert_eq!((ranges[0].start, ranges[0].end), (0, 0));
        assert_eq!((ranges[1].start, ranges[1].end), (1, 1));
        assert!(ranges.iter().all(|x| x.cnv_type == CnvType::Ins));
        assert_eq!(cells[0].copies, 3);
        assert_eq!(cells[2].copies, DEFAULT_COPY_NUMBER);
    }

    #[test]
    fn test_homozygous_deletion_seed() {
        let settings = CallCnvSettings::default();
        let mut cells = get_test_cells(&[vec![(0.05, -3.0), (0.05, -3.0)]]);

        // Second cell's reference is too low for the homozygous deletion test
        cells[1].reference = 0.005;
        let (ranges, _) = get_seed_ranges(&settings, 100.0, &mut cells);
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].start, 0);
        assert_eq!(ranges[0].cnv_type, CnvType::Del);
        assert_eq!(cells[0].copies, 0);
    }

    #[test]
    fn test_homozygous_deletion_seed_min_depth() {
        let settings = CallCnvSettings::default();

        // Reference depth of 1.0 * 10 is below the minimum absolute depth
        let mut cells = get_test_cells(&[vec![(0.05, -3.0)]]);
        let (ranges, inconsistent_seeds) = get_seed_ranges(&settings, 10.0, &mut cells);
        assert!(ranges.is_empty());
        assert!(inconsistent_seeds.is_empty());
        assert_eq!(cells[0].copies, DEFAULT_COPY_NUMBER);

        let mut cells = get_test_cells(&[vec![(0.05, -3.0)]]);
        let (ranges, _) = get_seed_ranges(&settings, settings.min_depth, &mut cells);
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].cnv_type, CnvType::Del);
    }

    #[test]
    fn test_inconsistent_seed() {
        let settings = CallCnvSettings::default();
        let mut cells = get_test_cells(&[vec![(1.1, 4.5)]]);
        let (ranges, inconsistent_seeds) = get_seed_ranges(&settings, 100.0, &mut cells);
        assert!(ranges.is_empty());
        assert_eq!(inconsistent_seeds.len(), 1);
        assert_eq!(inconsistent_seeds[0].region_index, 0);
        assert_eq!(cells[0].copies, DEFAULT_COPY_NUMBER);
    }

    #[test]
    fn test_seed_count_monotonic_in_min_z() {
        let values = [
            (1.5, 5.2),
            (0.5, -4.1),
            (1.5, 3.9),
            (1.0, 0.0),
            (0.4, -6.5),
            (1.6, 4.0),
            (1.5, 2.5),
        ];
        let mut last_seed_count = usize::MAX;
        for min_z in [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0] {
            let settings = CallCnvSettings {
                min_z,
                ..Default::default()
            };
            let mut cells = get_test_cells(&[values.to_vec()]);
            let (ranges, inconsistent_seeds) = get_seed_ranges(&settings, 100.0, &mut cells);
            let seed_count = ranges.len() + inconsistent_seeds.len();
            assert!(seed_count <= last_seed_count);
            last_seed_count = seed_count;
        }
    }
}
