//! Error types
//!
//! Replaying a trace never fails: malformed traces degrade to no-ops or empty
//! results. [`StackplayError`] covers the edges around the engine instead:
//! reading level and config files, and navigating a bounded snapshot
//! [`Timeline`](crate::snapshot::Timeline).

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StackplayError>;

#[derive(Debug, Error)]
pub enum StackplayError {
    /// A level or config file could not be read
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A level, config or answer document is not valid JSON for its schema
    #[error("Invalid {what}: {source}")]
    Json {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Adding a snapshot would exceed the timeline's memory budget
    #[error("Snapshot memory limit exceeded: {current} + {requested} > {limit} bytes")]
    SnapshotLimitExceeded {
        current: usize,
        requested: usize,
        limit: usize,
    },

    /// Cursor moved past the first or last snapshot
    #[error("{0}")]
    HistoryBoundary(&'static str),

    /// A step index outside the level or timeline
    #[error("Step {step} out of range (0..{len})")]
    StepOutOfRange { step: usize, len: usize },
}

impl StackplayError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StackplayError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(what: &'static str, source: serde_json::Error) -> Self {
        StackplayError::Json { what, source }
    }
}
