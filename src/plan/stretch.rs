//! Productive-stretch detection.
//!
//! A stretch is a run of snapshots whose mean inter-arrival stays at or
//! below 12 hours across a span of at least 36 hours — the signature of a
//! day or two of focused iteration. Each stretch is represented by three
//! keeps: its first snapshot, the one nearest 24 hours in, and its last.
//!
//! Detection is a two-pointer scan with an explicit state: from an anchor,
//! the forward cursor advances until both the span and mean-rate
//! constraints hold (RangeFound) or the input runs out; a found range
//! resumes the scan at its far end, so stretches never overlap.

use chrono::Duration;

use crate::source::{SnapshotId, SnapshotInfo};

pub const MIN_SPAN_HOURS: i64 = 36;
pub const MAX_MEAN_SECONDS: f64 = 12.0 * 3600.0;
pub const MID_TARGET_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stretch {
    pub first: SnapshotId,
    pub mid: SnapshotId,
    pub last: SnapshotId,
}

enum ScanState {
    Scanning,
    RangeFound { end: usize },
}

/// Find all productive stretches in a chronological snapshot slice.
pub fn detect_stretches(snapshots: &[SnapshotInfo]) -> Vec<Stretch> {
    let mut stretches = Vec::new();
    let mut anchor = 0;

    while anchor + 1 < snapshots.len() {
        let mut state = ScanState::Scanning;

        for cursor in (anchor + 1)..snapshots.len() {
            let span = snapshots[cursor].timestamp - snapshots[anchor].timestamp;
            if span < Duration::hours(MIN_SPAN_HOURS) {
                continue;
            }
            // mean inter-arrival: total span over interval count
            let mean = span.num_seconds() as f64 / (cursor - anchor) as f64;
            if mean <= MAX_MEAN_SECONDS {
                state = ScanState::RangeFound { end: cursor };
                break;
            }
        }

        match state {
            ScanState::RangeFound { end } => {
                stretches.push(build_stretch(snapshots, anchor, end));
                // skip ahead: the next stretch may start where this one ended
                anchor = end;
            }
            ScanState::Scanning => anchor += 1,
        }
    }

    stretches
}

/// Pick the {first, nearest-to-+24h, last} representatives of a range.
fn build_stretch(snapshots: &[SnapshotInfo], first: usize, last: usize) -> Stretch {
    let target = snapshots[first].timestamp + Duration::hours(MID_TARGET_HOURS);

    let mut mid = first;
    let mut best = i64::MAX;
    for k in first..=last {
        let diff = (snapshots[k].timestamp - target).num_seconds().abs();
        if diff < best {
            best = diff;
            mid = k;
        }
    }

    Stretch {
        first: snapshots[first].id,
        mid: snapshots[mid].id,
        last: snapshots[last].id,
    }
}
