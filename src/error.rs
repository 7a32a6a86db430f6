//! Error types for the retention engine.
//!
//! Most failure modes fail open by design: unreadable features become zero
//! deltas, a corrupt state file becomes an empty one, and a failed deletion
//! is reported without unwinding the already-persisted plan. The only fatal
//! condition is an unwritable state document, since an unrecorded decision
//! defeats the purpose of the run.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CullError {
    /// State document could not be serialized
    #[error("failed to serialize state document: {0}")]
    StateSerialize(#[from] serde_json::Error),

    /// State document could not be written and atomically replaced
    #[error("failed to persist state to {path}: {message}")]
    StateWrite { path: PathBuf, message: String },
}
