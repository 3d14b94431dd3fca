use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RotaError {
    #[error("not initialized: run 'rota init'")]
    NotInitialized,

    #[error("invalid id '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidId(String),

    #[error("invalid subject id in cohort '{0}': must not be empty")]
    EmptySubjectId(String),

    #[error("cohort not found: {0}")]
    CohortNotFound(String),

    #[error("cohort configuration unavailable: {0}")]
    ConfigurationUnavailable(String),

    #[error("persistence failed: {0}")]
    PersistenceFailed(String),

    #[error("inconsistent batch: {0}")]
    InconsistentBatch(String),

    #[error("stale cursor for cohort '{cohort}': expected {expected}, found {found}")]
    StaleCursor {
        cohort: String,
        expected: usize,
        found: usize,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl RotaError {
    /// Collapse this error into the kind reported on a failed resolution.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RotaError::ConfigurationUnavailable(_) => ErrorKind::ConfigurationUnavailable,
            RotaError::InconsistentBatch(_) | RotaError::CohortNotFound(_) => {
                ErrorKind::InconsistentBatch
            }
            RotaError::StaleCursor { .. } => ErrorKind::ConcurrentUpdate,
            _ => ErrorKind::PersistenceFailed,
        }
    }
}

/// Map any storage-engine error into `PersistenceFailed`.
pub(crate) fn db_err(e: impl fmt::Display) -> RotaError {
    RotaError::PersistenceFailed(e.to_string())
}

pub type Result<T> = std::result::Result<T, RotaError>;

// ---------------------------------------------------------------------------
// ErrorKind
// ---------------------------------------------------------------------------

/// Error marker carried by a failed `Resolution`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Cohort listing failed.
    ConfigurationUnavailable,
    /// Store `get` or `put` failed.
    PersistenceFailed,
    /// An atomic batch could not be applied as a whole.
    InconsistentBatch,
    /// Another writer advanced a cursor first (expected-cursor mode only).
    ConcurrentUpdate,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::ConfigurationUnavailable => "configuration_unavailable",
            ErrorKind::PersistenceFailed => "persistence_failed",
            ErrorKind::InconsistentBatch => "inconsistent_batch",
            ErrorKind::ConcurrentUpdate => "concurrent_update",
        };
        f.write_str(s)
    }
}
