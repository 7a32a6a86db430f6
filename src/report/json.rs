//! JSON output for a computed plan.
//!
//! Serializes the report surface — keep map with reasons, ordered delete
//! list, diagnostics — for scripting and piping.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::engine::RunOutcome;
use crate::plan::KeepReason;
use crate::source::SnapshotId;

#[derive(Serialize)]
struct JsonReport<'a> {
    keep: &'a BTreeMap<SnapshotId, KeepReason>,
    delete: &'a [SnapshotId],
    diagnostics: &'a [String],
}

pub fn render(outcome: &RunOutcome) -> String {
    let report = JsonReport {
        keep: &outcome.plan.keep,
        delete: &outcome.plan.delete,
        diagnostics: &outcome.diagnostics,
    };
    serde_json::to_string_pretty(&report).unwrap_or_else(|_| String::from("{}"))
}
