//! Cross-cutting error types for Vigil.
//!
//! Domain-specific errors (`RuleError`, `KnowledgeError`, `StoreError`) live
//! in their respective crates; this module holds errors raised by the shared
//! core types themselves.

use thiserror::Error;

/// Errors raised by core type parsing.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A string is not a member of the issue-type taxonomy.
    #[error("unknown issue type: {0}")]
    UnknownIssueType(String),

    /// A persisted issue key did not have the expected shape.
    #[error("malformed issue key: {0}")]
    MalformedKey(String),
}
