//! Activity scoring.
//!
//! Combines normalized feature deltas into one scalar per snapshot:
//!
//! ```text
//! score = 0.1 + 0.5 * norm(content_delta) + 0.4 * norm(structural_delta)
//! ```
//!
//! The 0.1 base credits the snapshot event itself; the first snapshot in a
//! sequence has no prior reference and scores exactly the base. Footprint
//! size is deliberately excluded from the weights: a large closure is not
//! evidence of an eventful change.

pub mod normalize;

use std::collections::HashMap;

use crate::source::{RawFeatures, SnapshotId, SnapshotInfo};

pub const BASE_WEIGHT: f64 = 0.1;
pub const CONTENT_WEIGHT: f64 = 0.5;
pub const STRUCTURAL_WEIGHT: f64 = 0.4;

/// Score every snapshot in [0.1, 1.0].
///
/// `features` holds raw deltas keyed by the newer snapshot of each
/// consecutive pair; missing entries count as zero deltas. Normalization
/// runs over the observed delta multisets, which exclude the first
/// snapshot.
pub fn score_snapshots(
    snapshots: &[SnapshotInfo],
    features: &HashMap<SnapshotId, RawFeatures>,
) -> HashMap<SnapshotId, f64> {
    let mut scores = HashMap::with_capacity(snapshots.len());
    if snapshots.is_empty() {
        return scores;
    }

    let delta = |snap: &SnapshotInfo| {
        features.get(&snap.id).copied().unwrap_or_default()
    };

    let content: Vec<u64> = snapshots[1..].iter().map(|s| delta(s).content_delta).collect();
    let structural: Vec<u64> = snapshots[1..].iter().map(|s| delta(s).structural_delta).collect();

    let norm_content = normalize::percentile_scale(&content);
    let norm_structural = normalize::percentile_scale(&structural);

    for (i, snap) in snapshots.iter().enumerate() {
        let score = if i == 0 {
            BASE_WEIGHT
        } else {
            let f = delta(snap);
            BASE_WEIGHT
                + CONTENT_WEIGHT * norm_content.get(&f.content_delta).copied().unwrap_or(0.0)
                + STRUCTURAL_WEIGHT * norm_structural.get(&f.structural_delta).copied().unwrap_or(0.0)
        };
        scores.insert(snap.id, score);
    }

    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn snapshots(n: u64) -> Vec<SnapshotInfo> {
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        (0..n)
            .map(|i| SnapshotInfo {
                id: i,
                timestamp: start + Duration::hours(i as i64 * 6),
            })
            .collect()
    }

    #[test]
    fn first_snapshot_scores_exactly_base() {
        let snaps = snapshots(5);
        let mut features = HashMap::new();
        features.insert(1, RawFeatures { content_delta: 9999, structural_delta: 9999 });

        let scores = score_snapshots(&snaps, &features);
        assert_eq!(scores[&0], BASE_WEIGHT);
    }

    #[test]
    fn all_scores_within_bounds() {
        let snaps = snapshots(10);
        let mut features = HashMap::new();
        for i in 1..10u64 {
            features.insert(i, RawFeatures { content_delta: i * 137, structural_delta: i * 3 });
        }

        let scores = score_snapshots(&snaps, &features);
        assert_eq!(scores.len(), 10);
        for (id, score) in &scores {
            assert!(
                (BASE_WEIGHT..=1.0).contains(score),
                "score({id}) = {score} out of bounds"
            );
        }
    }

    #[test]
    fn zero_deltas_score_base_everywhere() {
        let snaps = snapshots(8);
        let scores = score_snapshots(&snaps, &HashMap::new());
        for score in scores.values() {
            assert_eq!(*score, BASE_WEIGHT);
        }
    }

    #[test]
    fn missing_features_default_to_zero_delta() {
        let snaps = snapshots(4);
        let mut features = HashMap::new();
        // only snapshot 2 has observed deltas; 1 and 3 fell off the wire
        features.insert(2, RawFeatures { content_delta: 500, structural_delta: 40 });

        let scores = score_snapshots(&snaps, &features);
        assert!(scores[&2] > scores[&1]);
        assert_eq!(scores[&1], scores[&3]);
    }

    #[test]
    fn larger_deltas_never_score_lower() {
        let snaps = snapshots(6);
        let mut features = HashMap::new();
        for i in 1..6u64 {
            features.insert(i, RawFeatures { content_delta: i * 100, structural_delta: i * 10 });
        }

        let scores = score_snapshots(&snaps, &features);
        for i in 1..5u64 {
            assert!(scores[&i] <= scores[&(i + 1)], "score({i}) > score({})", i + 1);
        }
        assert!(scores[&1] < scores[&5]);
        assert_eq!(scores[&5], BASE_WEIGHT + CONTENT_WEIGHT + STRUCTURAL_WEIGHT);
    }

    #[test]
    fn empty_sequence_yields_no_scores() {
        assert!(score_snapshots(&[], &HashMap::new()).is_empty());
    }
}
