//! Error types for vigil-rules.

use thiserror::Error;

/// Errors from loading rule documents.
///
/// Note that per-node failures inside a rule are not errors: the extractor
/// records them as anomalies and continues. This type covers only the
/// document level (unreadable JSON, wrong top-level shape).
#[derive(Debug, Error)]
pub enum RuleError {
    /// The document is not valid JSON or has the wrong top-level shape.
    #[error("failed to parse rule document: {0}")]
    Parse(#[from] serde_json::Error),
}
