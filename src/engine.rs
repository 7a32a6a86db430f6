//! One planning pass.
//!
//! Orchestrates the full pipeline synchronously: enumerate, retrieve and
//! normalize features, score, smooth, plan, persist, and (in apply mode)
//! delete. Collaborator failures fail open into diagnostics wherever the
//! plan can still be computed; only an unwritable state document aborts
//! the run.

use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, Utc};

use crate::error::CullError;
use crate::plan::{self, smooth, Plan, PlanParams};
use crate::score;
use crate::source::{Deleter, RawFeatures, SnapshotId, SnapshotInfo, SnapshotSource};
use crate::state::{KeptRecord, SnapshotRecord, StateDocument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// compute and persist the plan, delete nothing
    Plan,
    /// compute, persist, then physically delete everything not kept
    Apply,
}

#[derive(Debug, Clone, Copy)]
pub struct EngineParams {
    pub sigma_hours: f64,
    pub plan: PlanParams,
}

impl Default for EngineParams {
    fn default() -> Self {
        EngineParams {
            sigma_hours: smooth::DEFAULT_SIGMA_HOURS,
            plan: PlanParams::default(),
        }
    }
}

pub struct RunOutcome {
    pub snapshots: Vec<SnapshotInfo>,
    pub scores: HashMap<SnapshotId, f64>,
    pub plan: Plan,
    pub diagnostics: Vec<String>,
    /// non-fatal failures, e.g. a deleter that refused to delete
    pub errors: Vec<String>,
    pub duration_ms: u128,
}

impl RunOutcome {
    fn empty(diagnostics: Vec<String>, start: Instant) -> Self {
        RunOutcome {
            snapshots: Vec::new(),
            scores: HashMap::new(),
            plan: Plan::default(),
            diagnostics,
            errors: Vec::new(),
            duration_ms: start.elapsed().as_millis(),
        }
    }
}

/// Run one planning pass against `source`, persisting to `state_path`.
///
/// An empty (or unenumerable) history is not an error: the outcome comes
/// back with no snapshots and the state file is left untouched. In
/// [`RunMode::Plan`] the deleter is never invoked and the deletion history
/// never grows, but snapshot records and the keep map are still persisted.
pub fn run(
    source: &dyn SnapshotSource,
    deleter: &dyn Deleter,
    state_path: &Path,
    params: &EngineParams,
    mode: RunMode,
) -> Result<RunOutcome, CullError> {
    let start = Instant::now();
    let mut diagnostics = Vec::new();

    let snapshots = match source.enumerate() {
        Ok(snapshots) => snapshots,
        Err(e) => {
            diagnostics.push(format!("{}: enumeration failed: {e}", source.name()));
            Vec::new()
        }
    };
    if snapshots.is_empty() {
        // nothing to do; don't touch the state file
        return Ok(RunOutcome::empty(diagnostics, start));
    }

    // raw feature deltas for consecutive pairs, failing open to zero
    let mut features: HashMap<SnapshotId, RawFeatures> = HashMap::new();
    for pair in snapshots.windows(2) {
        let (older, newer) = (&pair[0], &pair[1]);
        match source.raw_features(older, newer) {
            Ok(f) => {
                features.insert(newer.id, f);
            }
            Err(e) => {
                diagnostics.push(format!(
                    "{}: features for snapshot {} unavailable, scoring zero deltas: {e}",
                    source.name(),
                    newer.id
                ));
                features.insert(newer.id, RawFeatures::default());
            }
        }
    }

    let scores = score::score_snapshots(&snapshots, &features);
    let points: Vec<(DateTime<Utc>, f64)> = snapshots
        .iter()
        .map(|s| {
            let score = scores.get(&s.id).copied().unwrap_or(score::BASE_WEIGHT);
            (s.timestamp, score)
        })
        .collect();
    let grid = smooth::kernel_smooth(&points, params.sigma_hours);

    let (mut state, state_diag) = StateDocument::load(state_path);
    if let Some(diag) = state_diag {
        diagnostics.push(diag);
    }

    let protected = source.protected();
    let plan = plan::build(&snapshots, &grid, &protected, &state.pinned, &params.plan);

    // descriptive records advance on every run, plan-only included
    for snap in &snapshots {
        let score = scores.get(&snap.id).copied().unwrap_or(score::BASE_WEIGHT);
        state.snapshots.insert(
            snap.id,
            SnapshotRecord {
                timestamp: snap.timestamp,
                score,
            },
        );
    }
    state.kept = plan
        .keep
        .iter()
        .map(|(id, reason)| (*id, KeptRecord { reason: *reason }))
        .collect();
    state.last_run = Some(Utc::now());
    state.save(state_path)?;

    let mut errors = Vec::new();
    if mode == RunMode::Apply && !plan.delete.is_empty() {
        match deleter.delete(&plan.delete) {
            Ok(()) => {
                // history records only confirmed deletions
                state.deleted.extend(plan.delete.iter().copied());
                state.save(state_path)?;
            }
            Err(e) => errors.push(format!("{}: {e}", deleter.name())),
        }
    }

    Ok(RunOutcome {
        snapshots,
        scores,
        plan,
        diagnostics,
        errors,
        duration_ms: start.elapsed().as_millis(),
    })
}
