//! Rank all cohort samples by their similarity to each sample
//!

use std::sync::mpsc::channel;

use log::info;
use statrs::statistics::{Data, OrderStatistics};

use crate::sample::{PeerSimilarity, SENTINEL_SIMILARITY, SampleData};
use crate::stats_utils::{median_of_sorted, sort_values};

/// Maximum number of peer ranks to summarize in the log
const MAX_SUMMARY_PEER_RANK: usize = 30;

/// Region stride used to subsample the correlation computation
///
/// # Arguments
/// * `max_correlation_regions` - Approximate maximum number of regions used per correlation
///
pub fn get_correlation_stride(region_count: usize, max_correlation_regions: usize) -> usize {
    std::cmp::max(1, region_count / max_correlation_regions.max(1))
}

/// Pearson-style correlation of two normalized depth vectors, computed from deviations around
/// the expected normalized depth of 1.0
///
/// Only every `stride`-th region is used. The result is in [-1, 1], or NaN if either sample has
/// no deviation from 1.0 over the selected regions.
///
pub fn get_strided_deviation_correlation(x: &[f64], y: &[f64], stride: usize) -> f64 {
    assert_eq!(x.len(), y.len());
    assert!(stride > 0);

    let mut sum_xy = 0.0;
    let mut sum_xx = 0.0;
    let mut sum_yy = 0.0;
    for (xv, yv) in x.iter().zip(y.iter()).step_by(stride) {
        let dx = xv - 1.0;
        let dy = yv - 1.0;
        sum_xy += dx * dy;
        sum_xx += dx * dx;
        sum_yy += dy * dy;
    }
    sum_xy / (sum_xx * sum_yy).sqrt()
}

/// Get the similarity of every cohort sample to the target sample, sorted by descending
/// similarity
///
/// The target sample itself and all non-reference samples receive the sentinel similarity.
/// Ties are sorted by sample id.
///
fn get_sample_peers(
    sample_index: usize,
    samples: &[SampleData],
    stride: usize,
) -> Vec<PeerSimilarity> {
    let sample = &samples[sample_index];
    let mut peers = samples
        .iter()
        .enumerate()
        .map(|(peer_index, peer)| {
            let is_reference_peer = peer_index != sample_index && peer.is_reference;
            let similarity = if is_reference_peer {
                let x = get_strided_deviation_correlation(
                    &sample.norm_depth,
                    &peer.norm_depth,
                    stride,
                );
                if x.is_finite() { x } else { SENTINEL_SIMILARITY }
            } else {
                SENTINEL_SIMILARITY
            };
            PeerSimilarity {
                sample_id: peer.id,
                similarity,
                is_reference_peer,
            }
        })
        .collect::<Vec<_>>();

    peers.sort_by(|a, b| {
        b.similarity
            .total_cmp(&a.similarity)
            .then(a.sample_id.cmp(&b.sample_id))
    });
    peers
}

/// Compute the ranked peer list of every sample
///
/// Samples must be in sample id order, with no samples removed.
///
pub fn rank_sample_peers(
    thread_count: usize,
    max_correlation_regions: usize,
    samples: &mut [SampleData],
) {
    let region_count = samples.first().map_or(0, |x| x.region_count());
    let stride = get_correlation_stride(region_count, max_correlation_regions);
    info!(
        "Computing sample similarity for {} samples using every {} region(s)",
        samples.len(),
        stride
    );

    let worker_pool = rayon::ThreadPoolBuilder::new()
        .num_threads(thread_count)
        .build()
        .unwrap();

    let (tx, rx) = channel();
    let sample_data: &[SampleData] = samples;
    worker_pool.scope(move |scope| {
        for sample_index in 0..sample_data.len() {
            let tx = tx.clone();
            scope.spawn(move |_| {
                let peers = get_sample_peers(sample_index, sample_data, stride);
                tx.send((sample_index, peers)).unwrap();
            });
        }
    });

    let mut all_peers = vec![Vec::new(); samples.len()];
    for (sample_index, peers) in rx {
        all_peers[sample_index] = peers;
    }
    for (sample, peers) in samples.iter_mut().zip(all_peers) {
        sample.peers = peers;
    }
}

/// Quartiles of the similarity to the k-th most similar peer
#[derive(Debug)]
pub struct PeerRankSummary {
    pub rank: usize,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
}

/// Summarize the distribution of the k-th best peer similarity over all samples, for each
/// k up to a fixed maximum
///
/// Sentinel similarity values are skipped.
///
pub fn get_peer_rank_summary(samples: &[SampleData]) -> Vec<PeerRankSummary> {
    let max_rank = std::cmp::min(
        MAX_SUMMARY_PEER_RANK,
        samples.len().saturating_sub(1),
    );

    let mut summary = Vec::new();
    for rank_index in 0..max_rank {
        let mut values = samples
            .iter()
            .filter_map(|x| x.peers.get(rank_index))
            .filter(|x| x.similarity != SENTINEL_SIMILARITY)
            .map(|x| x.similarity)
            .collect::<Vec<_>>();
        if values.is_empty() {
            continue;
        }
        sort_values(&mut values);
        let median = median_of_sorted(&values);
        let mut data = Data::new(values);
        summary.push(PeerRankSummary {
            rank: rank_index + 1,
            q1: data.lower_quartile(),
            median,
            q3: data.upper_quartile(),
        });
    }
    summary
}

pub fn log_peer_rank_summary(samples: &[SampleData]) {
    info!("Sample similarity by peer rank:");
    for x in get_peer_rank_summary(samples) {
        info!(
            "{:>4}: q3={:.3} median={:.3} q1={:.3}",
            x.rank, x.q3, x.median, x.q1
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_ulps_eq};

    fn get_norm_sample(id: usize, is_reference: bool, norm_depth: Vec<f64>) -> SampleData {
        let mut sample = SampleData::new(id, &format!("s{id}"), is_reference, Vec::new());
        sample.norm_depth = norm_depth;
        sample
    }

    #[test]
    fn test_get_correlation_stride() {
        assert_eq!(get_correlation_stride(100, 20000), 1);
        assert_eq!(get_correlation_stride(50000, 20000), 2);
        assert_eq!(get_correlation_stride(0, 20000), 1);
    }

    #[test]
    fn test_strided_deviation_correlation() {
        let x = [1.1, 0.9, 1.2, 0.8];
        let y = [1.2, 0.8, 1.4, 0.6];
        assert_abs_diff_eq!(
            get_strided_deviation_correlation(&x, &y, 1),
            1.0,
            epsilon = 1e-10
        );

        let y = [0.9, 1.1, 0.8, 1.2];
        assert_abs_diff_eq!(
            get_strided_deviation_correlation(&x, &y, 1),
            -1.0,
            epsilon = 1e-10
        );

        // Only regions 0 and 2 are used with stride 2
        let y = [1.1, 5.0, 1.2, -3.0];
        assert_abs_diff_eq!(
            get_strided_deviation_correlation(&x, &y, 2),
            1.0,
            epsilon = 1e-10
        );

        let y = [1.0, 1.0, 1.0, 1.0];
        assert!(get_strided_deviation_correlation(&x, &y, 1).is_nan());
    }

    #[test]
    fn test_rank_sample_peers() {
        let mut samples = vec![
            get_norm_sample(0, true, vec![1.1, 0.9, 1.2, 0.8]),
            get_norm_sample(1, true, vec![1.2, 0.8, 1.3, 0.8]),
            get_norm_sample(2, true, vec![0.9, 1.1, 0.9, 1.1]),
            get_norm_sample(3, false, vec![1.1, 0.9, 1.2, 0.8]),
        ];
        rank_sample_peers(2, 20000, &mut samples);

        let peers = &samples[0].peers;
        assert_eq!(peers.len(), 4);
        assert_eq!(peers[0].sample_id, 1);
        assert!(peers[0].is_reference_peer);
        assert_eq!(peers[1].sample_id, 2);
        assert!(peers[1].similarity < 0.0);
        assert!(peers[1].similarity > SENTINEL_SIMILARITY);

        // Self and non-reference peers receive the sentinel and sort last by id
        assert_eq!(peers[2].sample_id, 0);
        assert!(!peers[2].is_reference_peer);
        assert_eq!(peers[3].sample_id, 3);
        assert!(!peers[3].is_reference_peer);
        assert_ulps_eq!(peers[3].similarity, SENTINEL_SIMILARITY);

        // Non-reference samples still get their own ranking
        assert_eq!(samples[3].peers[0].sample_id, 0);
    }

    #[test]
    fn test_flat_sample_similarity_is_sentinel() {
        let mut samples = vec![
            get_norm_sample(0, true, vec![1.0, 1.0, 1.0]),
            get_norm_sample(1, true, vec![1.1, 0.9, 1.0]),
        ];
        rank_sample_peers(1, 20000, &mut samples);
        assert_ulps_eq!(samples[0].peers[0].similarity, SENTINEL_SIMILARITY);
        assert_ulps_eq!(samples[1].peers[0].similarity, SENTINEL_SIMILARITY);
    }

    #[test]
    fn test_peer_rank_summary() {
        let mut samples = vec![
            get_norm_sample(0, true, vec![1.1, 0.9, 1.2, 0.8]),
            get_norm_sample(1, true, vec![1.2, 0.8, 1.3, 0.8]),
            get_norm_sample(2, true, vec![1.0, 0.9, 1.3, 0.7]),
        ];
        rank_sample_peers(1, 20000, &mut samples);
        let summary = get_peer_rank_summary(&samples);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].rank, 1);
        assert!(summary[0].q1 <= summary[0].median);
        assert!(summary[0].median <= summary[0].q3);
        assert!(summary[0].median >= summary[1].median);
    }
}
