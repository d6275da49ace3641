//! Engine-level errors.

use thiserror::Error;

/// Failures surfaced by the validation engine's control operations.
///
/// Validation itself never fails; only knowledge refreshes and store writes
/// can.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("knowledge rebuild failed: {0}")]
    Knowledge(#[from] vigil_knowledge::KnowledgeError),

    #[error("store operation failed: {0}")]
    Store(#[from] vigil_store::StoreError),
}
