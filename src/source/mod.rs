//! Collaborator seams for the retention engine.
//!
//! The engine itself never touches the system it is thinning: it consumes a
//! [`SnapshotSource`] for enumeration, protection and feature retrieval, and
//! hands confirmed deletions to a [`Deleter`]. Production wires these to the
//! NixOS profile backend in [`nix`]; tests wire them to in-memory mocks.

pub mod nix;

use chrono::{DateTime, Utc};

pub type SnapshotId = u64;

/// One enumerated snapshot: a unique id and its creation instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotInfo {
    pub id: SnapshotId,
    pub timestamp: DateTime<Utc>,
}

/// Raw per-snapshot deltas against the previous snapshot.
///
/// The first snapshot of a sequence has no prior reference; its deltas are
/// defined as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawFeatures {
    /// changed content lines (e.g. configuration diff size)
    pub content_delta: u64,
    /// changed structure (e.g. store paths added + removed)
    pub structural_delta: u64,
}

/// Snapshots that must never be deleted, whatever the tiers decide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProtectedIds {
    pub current: Option<SnapshotId>,
    pub previous: Option<SnapshotId>,
}

pub trait SnapshotSource {
    fn name(&self) -> &'static str;

    /// All known snapshots, ascending by timestamp.
    ///
    /// An error means the backing store could not be queried at all; the
    /// engine treats that as an empty history and reports nothing to do.
    fn enumerate(&self) -> Result<Vec<SnapshotInfo>, String>;

    /// Currently and previously active snapshots.
    fn protected(&self) -> ProtectedIds;

    /// Raw feature deltas for a consecutive pair.
    ///
    /// Errors fail open: the engine records a diagnostic and scores the
    /// pair with zero deltas rather than aborting the plan.
    fn raw_features(
        &self,
        older: &SnapshotInfo,
        newer: &SnapshotInfo,
    ) -> Result<RawFeatures, String>;
}

pub trait Deleter {
    fn name(&self) -> &'static str;

    /// Physically delete the given snapshots.
    ///
    /// Must only return `Ok` once the deletion is confirmed; the engine
    /// extends the persisted deletion history on success and leaves it
    /// untouched on failure.
    fn delete(&self, ids: &[SnapshotId]) -> Result<(), String>;
}
