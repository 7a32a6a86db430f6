//! Terminal table rendering for a computed plan.
//!
//! Formats the keep/delete partition for operators:
//! - groups kept snapshots by keep reason, safety rules first
//! - shows timestamp, age relative to the newest snapshot, and score
//! - lists planned deletions as a compact id sequence

use std::collections::HashMap;

use crate::engine::RunOutcome;
use crate::plan::KeepReason;
use crate::source::{SnapshotId, SnapshotInfo};
use crate::util::format_age;

const REASON_ORDER: [KeepReason; 9] = [
    KeepReason::Protected,
    KeepReason::Pinned,
    KeepReason::Recent,
    KeepReason::Daily,
    KeepReason::ProductiveFirst,
    KeepReason::ProductiveMid,
    KeepReason::ProductiveLast,
    KeepReason::ClumpLongterm,
    KeepReason::Monthly,
];

pub fn render(outcome: &RunOutcome) -> String {
    let Some(latest) = outcome.snapshots.last() else {
        return String::from("No snapshots found.\n");
    };
    let now = latest.timestamp;

    let by_id: HashMap<SnapshotId, &SnapshotInfo> =
        outcome.snapshots.iter().map(|s| (s.id, s)).collect();

    let mut output = String::new();
    output.push_str(&format!(
        "{} snapshots, keeping {}, deleting {}\n",
        outcome.snapshots.len(),
        outcome.plan.keep.len(),
        outcome.plan.delete.len()
    ));

    for reason in REASON_ORDER {
        let kept: Vec<SnapshotId> = outcome
            .plan
            .keep
            .iter()
            .filter(|(_, r)| **r == reason)
            .map(|(id, _)| *id)
            .collect();
        if kept.is_empty() {
            continue;
        }

        output.push_str(&format!("\n{}\n", reason.as_str()));
        output.push_str(&"-".repeat(40));
        output.push('\n');

        for id in kept {
            // protected ids may not correspond to an enumerated snapshot
            let Some(snap) = by_id.get(&id) else {
                output.push_str(&format!("  #{id:<6} (not enumerated)\n"));
                continue;
            };
            let score = outcome.scores.get(&id).copied().unwrap_or(0.0);
            output.push_str(&format!(
                "  #{:<6} {}  age {:>7}  score {:.2}\n",
                id,
                snap.timestamp.format("%Y-%m-%d %H:%M:%S"),
                format_age(now - snap.timestamp),
                score
            ));
        }
    }

    output.push('\n');
    if outcome.plan.delete.is_empty() {
        output.push_str("nothing to delete\n");
    } else {
        let ids: Vec<String> = outcome.plan.delete.iter().map(ToString::to_string).collect();
        output.push_str(&format!("planned deletions: {}\n", ids.join(", ")));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::Plan;
    use chrono::{Duration, TimeZone, Utc};
    use std::collections::BTreeMap;

    fn outcome() -> RunOutcome {
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let snapshots: Vec<SnapshotInfo> = (0..3u64)
            .map(|i| SnapshotInfo {
                id: i,
                timestamp: start + Duration::days(i as i64),
            })
            .collect();

        let mut keep = BTreeMap::new();
        keep.insert(1, KeepReason::Daily);
        keep.insert(2, KeepReason::Recent);

        RunOutcome {
            snapshots,
            scores: HashMap::from([(0, 0.1), (1, 0.35), (2, 0.1)]),
            plan: Plan {
                keep,
                delete: vec![0],
            },
            diagnostics: vec![],
            errors: vec![],
            duration_ms: 4,
        }
    }

    #[test]
    fn empty_outcome_renders_placeholder() {
        let mut empty = outcome();
        empty.snapshots.clear();
        assert_eq!(render(&empty), "No snapshots found.\n");
    }

    #[test]
    fn summary_line_counts_partition() {
        let rendered = render(&outcome());
        assert!(rendered.starts_with("3 snapshots, keeping 2, deleting 1\n"));
    }

    #[test]
    fn groups_appear_with_reason_headers() {
        let rendered = render(&outcome());
        assert!(rendered.contains("\nrecent\n"));
        assert!(rendered.contains("\ndaily\n"));
        assert!(rendered.contains("#2"));
        assert!(rendered.contains("score 0.35"));
    }

    #[test]
    fn deletions_listed_or_placeholder() {
        let rendered = render(&outcome());
        assert!(rendered.contains("planned deletions: 0\n"));

        let mut kept_all = outcome();
        kept_all.plan.delete.clear();
        assert!(render(&kept_all).contains("nothing to delete\n"));
    }
}
