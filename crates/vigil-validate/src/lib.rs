//! # vigil-validate
//!
//! The validation layer: the state, service, and template validators, issue
//! aggregation, and the [`ValidationEngine`] facade that wires them to the
//! knowledge base and the persistence stores.
//!
//! Each reference concern is checked in exactly one validator; the
//! aggregator deduplicates by identity, filters suppressed findings, and
//! produces the grouped, deterministically-ordered report.

pub mod aggregate;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod service;
pub mod state;
pub mod suggest;
pub mod template;

pub use aggregate::{GroupedIssues, aggregate};
pub use engine::{EngineOptions, ValidationEngine, ValidationReport};
pub use error::EngineError;
pub use service::{
    FieldSchema, InMemorySchemas, ServiceSchema, ServiceSchemaProvider, ServiceValidator,
};
pub use state::StateValidator;
pub use template::{BasicTemplateParser, ParsedTemplate, TemplateParser, TemplateValidator};
