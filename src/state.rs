//! Persisted planning state.
//!
//! One JSON document per state path:
//! - per-snapshot timestamp/score records (descriptive, audit-only)
//! - the keep map with reasons from the latest run
//! - append-only deletion history
//! - operator-pinned ids (the only field consumed as planning input)
//!
//! Loaded once at run start, rewritten atomically at the end of every run,
//! plan-only runs included. A missing or corrupt document degrades to an
//! empty one, since everything except pins is recomputed anyway; failing to
//! write the document back is the engine's only fatal error.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::CullError;
use crate::plan::KeepReason;
use crate::source::SnapshotId;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub timestamp: DateTime<Utc>,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeptRecord {
    pub reason: KeepReason,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateDocument {
    pub snapshots: BTreeMap<SnapshotId, SnapshotRecord>,
    pub kept: BTreeMap<SnapshotId, KeptRecord>,
    pub deleted: Vec<SnapshotId>,
    pub pinned: BTreeSet<SnapshotId>,
    pub last_run: Option<DateTime<Utc>>,
}

impl StateDocument {
    /// Load the document at `path`.
    ///
    /// Absent and unreadable/malformed files both yield an empty document;
    /// the latter additionally yields a diagnostic so the recovery is
    /// visible to the operator.
    pub fn load(path: &Path) -> (StateDocument, Option<String>) {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return (StateDocument::default(), None);
            }
            Err(e) => {
                let diag = format!(
                    "state file {} unreadable, starting fresh: {e}",
                    path.display()
                );
                return (StateDocument::default(), Some(diag));
            }
        };

        match serde_json::from_str(&raw) {
            Ok(doc) => (doc, None),
            Err(e) => {
                let diag = format!(
                    "state file {} malformed, starting fresh: {e}",
                    path.display()
                );
                (StateDocument::default(), Some(diag))
            }
        }
    }

    /// Atomically replace the document at `path`.
    ///
    /// Serializes into a scoped temporary file next to the target and
    /// renames it into place, so a reader never observes a partial write.
    pub fn save(&self, path: &Path) -> Result<(), CullError> {
        let write_err = |message: String| CullError::StateWrite {
            path: path.to_path_buf(),
            message,
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| write_err(e.to_string()))?;

        let json = serde_json::to_string_pretty(self)?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| write_err(e.to_string()))?;
        tmp.write_all(json.as_bytes())
            .map_err(|e| write_err(e.to_string()))?;
        tmp.persist(path).map_err(|e| write_err(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn sample() -> StateDocument {
        let ts = Utc.with_ymd_and_hms(2025, 7, 1, 9, 30, 0).unwrap();
        StateDocument {
            snapshots: BTreeMap::from([
                (3, SnapshotRecord { timestamp: ts, score: 0.1 }),
                (4, SnapshotRecord { timestamp: ts, score: 0.85 }),
            ]),
            kept: BTreeMap::from([(4, KeptRecord { reason: KeepReason::Recent })]),
            deleted: vec![1, 2],
            pinned: BTreeSet::from([3]),
            last_run: Some(ts),
        }
    }

    #[test]
    fn missing_file_loads_empty_without_diagnostic() {
        let dir = TempDir::new().unwrap();
        let (doc, diag) = StateDocument::load(&dir.path().join("state.json"));
        assert_eq!(doc, StateDocument::default());
        assert!(diag.is_none());
    }

    #[test]
    fn corrupt_file_loads_empty_with_diagnostic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{ this is not json").unwrap();

        let (doc, diag) = StateDocument::load(&path);
        assert_eq!(doc, StateDocument::default());
        assert!(diag.unwrap().contains("malformed"));
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        let doc = sample();
        doc.save(&path).unwrap();

        let (loaded, diag) = StateDocument::load(&path);
        assert!(diag.is_none());
        assert_eq!(loaded, doc);
    }

    #[test]
    fn save_creates_missing_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/state.json");

        sample().save(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn save_leaves_no_temporary_droppings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        sample().save(&path).unwrap();
        sample().save(&path).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec!["state.json"]);
    }

    #[test]
    fn partial_fields_deserialize_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, r#"{"pinned": [7, 9]}"#).unwrap();

        let (doc, diag) = StateDocument::load(&path);
        assert!(diag.is_none());
        assert_eq!(doc.pinned, BTreeSet::from([7, 9]));
        assert!(doc.snapshots.is_empty());
        assert!(doc.last_run.is_none());
    }
}
