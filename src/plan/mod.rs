//! Tiered retention planning.
//!
//! Merges all retention rules into one keep/delete decision:
//! - protected and pinned snapshots are kept unconditionally
//! - age <= 3d: everything kept
//! - 3-10d: latest per UTC day, plus productive-stretch representatives
//! - > 10d: one keep per clump window selected over the density curve
//! - > 90d: latest per calendar month fills remaining gaps
//!
//! Rules apply as an ordered union: later rules add keeps, never remove
//! them. The whole computation is a pure function of its inputs, so two
//! runs over identical history produce the identical partition.

pub mod smooth;
pub mod stretch;
pub mod windows;

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::source::{ProtectedIds, SnapshotId, SnapshotInfo};
use smooth::DensityGrid;
use windows::WindowParams;

/// Why a snapshot is retained. Closed set, so every consumer can match
/// exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeepReason {
    Protected,
    Pinned,
    Recent,
    Daily,
    ProductiveFirst,
    ProductiveMid,
    ProductiveLast,
    ClumpLongterm,
    Monthly,
}

impl KeepReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeepReason::Protected => "protected",
            KeepReason::Pinned => "pinned",
            KeepReason::Recent => "recent",
            KeepReason::Daily => "daily",
            KeepReason::ProductiveFirst => "productive-first",
            KeepReason::ProductiveMid => "productive-mid",
            KeepReason::ProductiveLast => "productive-last",
            KeepReason::ClumpLongterm => "clump-longterm",
            KeepReason::Monthly => "monthly",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PlanParams {
    /// everything younger than this is kept in full
    pub recent_days: i64,
    /// end of the daily-sampling tier
    pub daily_days: i64,
    /// beyond this age, monthly sampling fills gaps
    pub monthly_after_days: i64,
    pub clump: WindowParams,
}

impl Default for PlanParams {
    fn default() -> Self {
        PlanParams {
            recent_days: 3,
            daily_days: 10,
            monthly_after_days: 90,
            clump: WindowParams::default(),
        }
    }
}

/// The final partition: every enumerated id is either kept with a reason
/// or listed for deletion, never both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub keep: BTreeMap<SnapshotId, KeepReason>,
    pub delete: Vec<SnapshotId>,
}

/// Build the keep/delete plan for a chronological snapshot history.
///
/// `grid` is the smoothed activity curve over the full history; only its
/// long tail (hours at or before now − daily_days) feeds window selection.
/// Ages are measured from the most recent snapshot, not the wall clock, so
/// a dormant machine does not slowly shed its history.
pub fn build(
    snapshots: &[SnapshotInfo],
    grid: &DensityGrid,
    protected: &ProtectedIds,
    pinned: &BTreeSet<SnapshotId>,
    params: &PlanParams,
) -> Plan {
    let Some(latest) = snapshots.last() else {
        return Plan::default();
    };
    let now = latest.timestamp;

    let mut keep: BTreeMap<SnapshotId, KeepReason> = BTreeMap::new();

    // recent tier: full granularity
    for snap in snapshots {
        if now - snap.timestamp <= Duration::days(params.recent_days) {
            keep.entry(snap.id).or_insert(KeepReason::Recent);
        }
    }

    // daily tier: latest snapshot per UTC calendar date
    let tier: Vec<SnapshotInfo> = snapshots
        .iter()
        .filter(|s| {
            let age = now - s.timestamp;
            age > Duration::days(params.recent_days) && age <= Duration::days(params.daily_days)
        })
        .copied()
        .collect();

    let mut daily: BTreeMap<NaiveDate, SnapshotInfo> = BTreeMap::new();
    for snap in &tier {
        let slot = daily.entry(snap.timestamp.date_naive()).or_insert(*snap);
        if snap.timestamp > slot.timestamp {
            *slot = *snap;
        }
    }
    for snap in daily.values() {
        keep.entry(snap.id).or_insert(KeepReason::Daily);
    }

    // productive stretches within the daily tier
    for found in stretch::detect_stretches(&tier) {
        keep.entry(found.first).or_insert(KeepReason::ProductiveFirst);
        keep.entry(found.mid).or_insert(KeepReason::ProductiveMid);
        keep.entry(found.last).or_insert(KeepReason::ProductiveLast);
    }

    // long tail: one keep per clump window, latest contained snapshot
    let cutoff = now - Duration::days(params.daily_days);
    let tail = grid.up_to(cutoff);
    for window in windows::select_windows(&tail, &params.clump) {
        let contained = snapshots
            .iter()
            .filter(|s| s.timestamp >= window.start && s.timestamp <= window.end)
            .next_back();
        if let Some(snap) = contained {
            keep.entry(snap.id).or_insert(KeepReason::ClumpLongterm);
        }
    }

    // deep history: latest snapshot per calendar month fills the gaps
    let mut months: BTreeMap<(i32, u32), SnapshotInfo> = BTreeMap::new();
    for snap in snapshots {
        if now - snap.timestamp > Duration::days(params.monthly_after_days) {
            let key = (snap.timestamp.year(), snap.timestamp.month());
            let slot = months.entry(key).or_insert(*snap);
            if snap.timestamp > slot.timestamp {
                *slot = *snap;
            }
        }
    }
    for snap in months.values() {
        keep.entry(snap.id).or_insert(KeepReason::Monthly);
    }

    // pinned and protected override whatever the tiers decided
    for snap in snapshots {
        if pinned.contains(&snap.id) {
            keep.insert(snap.id, KeepReason::Pinned);
        }
    }
    for id in [protected.current, protected.previous].into_iter().flatten() {
        keep.insert(id, KeepReason::Protected);
    }

    let mut delete: Vec<SnapshotId> = snapshots
        .iter()
        .map(|s| s.id)
        .filter(|id| !keep.contains_key(id))
        .collect();
    delete.sort_unstable();

    // hard safety invariant: protected ids can never reach the delete list,
    // whatever the rules above computed
    delete.retain(|id| Some(*id) != protected.current && Some(*id) != protected.previous);

    Plan { keep, delete }
}
