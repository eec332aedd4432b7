//! Build a synthetic reference for each sample from its most similar QC-passing peers
//!

use std::sync::mpsc::channel;

use log::info;

use crate::sample::{PeerSimilarity, SampleData};
use crate::stats_utils::{MAD_SCALE_FACTOR, median, median_abs_deviation, pearson_correlation};
use crate::target_region::TargetRegion;

/// Peer depth values outside of this range relative to the region median are skipped
const MIN_PEER_DEPTH_FACTOR: f64 = 0.25;
const MAX_PEER_DEPTH_FACTOR: f64 = 1.75;

/// Minimum reference spread as a fraction of the reference value
const MIN_SPREAD_FACTOR: f64 = 0.1;

/// Reference spread as a fraction of the region median when not enough peers are available
const FALLBACK_SPREAD_FACTOR: f64 = 0.3;

pub struct ReferenceSettings {
    /// Number of peer depth values used to build each reference value
    pub neighbor_count: usize,
}

/// Synthetic reference for one sample
pub struct SampleReference {
    pub reference: Vec<f64>,
    pub spread: Vec<f64>,

    /// Pearson correlation of the sample's normalized depth to the reference
    pub correlation: f64,
}

/// Select normalized depth values for one region from the sample's peers, in order of
/// descending similarity
///
/// Non-reference and QC-failing peers are skipped, as are peer values far from the region
/// median. At most `neighbor_count` values are returned.
///
/// # Arguments
/// * `peer_is_pass` - QC state of each sample, indexed by sample id
///
pub fn select_peer_values(
    neighbor_count: usize,
    peers: &[PeerSimilarity],
    samples: &[SampleData],
    peer_is_pass: &[bool],
    region: &TargetRegion,
) -> Vec<f64> {
    let min_value = MIN_PEER_DEPTH_FACTOR * region.median;
    let max_value = MAX_PEER_DEPTH_FACTOR * region.median;

    let mut values = Vec::with_capacity(neighbor_count);
    for peer in peers.iter() {
        if values.len() == neighbor_count {
            break;
        }
        if !(peer.is_reference_peer && peer_is_pass[peer.sample_id]) {
            continue;
        }
        let value = samples[peer.sample_id].norm_depth[region.index];
        if value >= min_value && value <= max_value {
            values.push(value);
        }
    }
    values
}

/// Get the reference value and spread for one region from the selected peer values
///
/// If fewer than `neighbor_count` values are available, the region median is used as the
/// reference with a fixed relative spread.
///
pub fn get_region_reference(
    neighbor_count: usize,
    mut values: Vec<f64>,
    region: &TargetRegion,
) -> (f64, f64) {
    if neighbor_count > 0 && values.len() == neighbor_count {
        let reference = median(&mut values);
        let spread = MAD_SCALE_FACTOR * median_abs_deviation(&values, reference);
        (reference, spread.max(MIN_SPREAD_FACTOR * reference))
    } else {
        (region.median, FALLBACK_SPREAD_FACTOR * region.median)
    }
}

fn get_sample_reference(
    settings: &ReferenceSettings,
    sample: &SampleData,
    samples: &[SampleData],
    peer_is_pass: &[bool],
    regions: &[TargetRegion],
) -> SampleReference {
    let mut reference = Vec::with_capacity(regions.len());
    let mut spread = Vec::with_capacity(regions.len());
    for region in regions.iter() {
        let values = select_peer_values(
            settings.neighbor_count,
            &sample.peers,
            samples,
            peer_is_pass,
            region,
        );
        let (r, s) = get_region_reference(settings.neighbor_count, values, region);
        reference.push(r);
        spread.push(s);
    }
    let correlation = pearson_correlation(&sample.norm_depth, &reference);
    SampleReference {
        reference,
        spread,
        correlation,
    }
}

/// Build the synthetic reference of every sample
///
/// Samples must be in sample id order with no samples removed, and peer rankings must already be
/// computed. Peer eligibility uses the sample QC state from before this step, so the result does
/// not depend on the order samples are processed in.
///
pub fn build_synthetic_references(
    thread_count: usize,
    settings: &ReferenceSettings,
    regions: &[TargetRegion],
    samples: &mut [SampleData],
) {
    info!(
        "Building synthetic references from {} peers per region",
        settings.neighbor_count
    );

    let peer_is_pass = &samples.iter().map(|x| x.qc.is_pass()).collect::<Vec<_>>();

    let worker_pool = rayon::ThreadPoolBuilder::new()
        .num_threads(thread_count)
        .build()
        .unwrap();

    let (tx, rx) = channel();
    let sample_data: &[SampleData] = samples;
    worker_pool.scope(move |scope| {
        for (sample_index, sample) in sample_data.iter().enumerate() {
            let tx = tx.clone();
            scope.spawn(move |_| {
                let sample_reference =
                    get_sample_reference(settings, sample, sample_data, peer_is_pass, regions);
                tx.send((sample_index, sample_reference)).unwrap();
            });
        }
    });

    let mut all_references = samples.iter().map(|_| None).collect::<Vec<_>>();
    for (sample_index, sample_reference) in rx {
        all_references[sample_index] = Some(sample_reference);
    }
    for (sample, sample_reference) in samples.iter_mut().zip(all_references) {
        let sample_reference = sample_reference.unwrap();
        sample.reference = sample_reference.reference;
        sample.reference_spread = sample_reference.spread;
        sample.reference_correlation = sample_reference.correlation;
    }
}
