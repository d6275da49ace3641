//! # vigil-rules
//!
//! The closed rule grammar and the Reference Extractor.
//!
//! Rule definitions (triggers, conditions, actions) deserialize into
//! tagged-variant types; the [`Extractor`] walks them to a fixed maximum
//! depth and produces a flat, typed reference set with provenance. It has no
//! knowledge of validity — cross-referencing is the validators' job.

pub mod error;
pub mod extract;
pub mod grammar;
pub mod scan;

pub use error::RuleError;
pub use extract::{Anomaly, AnomalyKind, DEFAULT_MAX_DEPTH, Extraction, Extractor};
pub use grammar::Rule;

use serde_json::Value;

/// Parse a rule document: either a single rule object or an array of rules.
///
/// # Errors
///
/// Returns [`RuleError::Parse`] when the text is not valid JSON or the top
/// level is neither an object nor an array of objects.
pub fn parse_rules(text: &str) -> Result<Vec<Rule>, RuleError> {
    let value: Value = serde_json::from_str(text)?;
    let rules = match value {
        Value::Array(_) => serde_json::from_value(value)?,
        other => vec![serde_json::from_value(other)?],
    };
    Ok(rules)
}
