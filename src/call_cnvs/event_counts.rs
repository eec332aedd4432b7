use super::CnvRange;
use super::cell_stats::{DEFAULT_COPY_NUMBER, ResultCell};

/// Number of CNV events overlapping each sample and region of the compacted cohort
#[derive(Debug, Default)]
pub struct EventCounts {
    /// Event count per sample index
    pub sample: Vec<usize>,

    /// Event count per region index, counting only cells with a non-default copy number
    pub region: Vec<usize>,
}

pub fn count_events(
    cells: &[ResultCell],
    ranges: &[CnvRange],
    sample_count: usize,
    region_count: usize,
) -> EventCounts {
    let mut counts = EventCounts {
        sample: vec![0; sample_count],
        region: vec![0; region_count],
    };
    for range in ranges.iter() {
        counts.sample[range.sample_index] += 1;
        for cell in cells[range.start..=range.end].iter() {
            if cell.copies != DEFAULT_COPY_NUMBER {
                counts.region[cell.region_index] += 1;
            }
        }
    }
    counts
}
