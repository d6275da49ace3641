//! # vigil-core
//!
//! Core types shared across all Vigil crates:
//! - `Reference` — a normalized pointer extracted from a rule definition
//! - `ValidationIssue` and its identity `IssueKey`
//! - Severity, issue-type taxonomy, and presentation groups
//! - Entity-id helpers
//! - Cross-cutting error types

pub mod enums;
pub mod errors;
pub mod ids;
pub mod issue;
pub mod reference;

pub use enums::{IssueType, KnowledgeSource, ReferenceKind, Severity, ValidationGroup};
pub use errors::CoreError;
pub use issue::{IssueKey, ValidationIssue};
pub use reference::{FieldValue, Reference, ServiceCallRef};
