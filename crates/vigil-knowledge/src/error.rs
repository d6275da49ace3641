//! Error types for vigil-knowledge.

use thiserror::Error;

/// Errors from knowledge-base sources.
///
/// A failing source degrades to "no opinion" for its entities rather than
/// failing the rebuild; this type mostly travels through logs, not callers.
#[derive(Debug, Error)]
pub enum KnowledgeError {
    /// A source (history, registry) could not be queried.
    #[error("knowledge source {name} unavailable: {detail}")]
    SourceUnavailable { name: &'static str, detail: String },

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
