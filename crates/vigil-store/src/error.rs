//! Store error types.

use thiserror::Error;

/// Errors from suppression/learned-state persistence.
///
/// Persistence failures propagate to the caller of the mutating operation;
/// the on-disk file is never left half-written (writes go through a temp
/// file and an atomic rename).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization failed: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("atomic replace failed: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("store path has no parent directory: {0}")]
    BadPath(String),
}
