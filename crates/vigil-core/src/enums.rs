//! Severity, reference-kind, issue-type, and group enums for Vigil.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`.
//! `IssueType` is the closed issue taxonomy: every variant maps to exactly one
//! `ValidationGroup` and carries a default `Severity`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Issue severity. Ordered so that `Error` compares greatest — deduplication
/// keeps `max(severity)` when two validators emit the same identity key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Error,
}

impl Severity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ReferenceKind
// ---------------------------------------------------------------------------

/// What a `Reference` points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// An entity state value (`to: "open"`).
    State,
    /// An entity attribute, optionally with a value constraint.
    Attribute,
    /// A `domain.service` call with its data fields.
    Service,
    /// An embedded template string.
    Template,
    /// A registry id: device, area, or tag.
    Registry,
}

impl ReferenceKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::State => "state",
            Self::Attribute => "attribute",
            Self::Service => "service",
            Self::Template => "template",
            Self::Registry => "registry",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ValidationGroup
// ---------------------------------------------------------------------------

/// Fixed, totally-ordered presentation group for issues.
///
/// Every `IssueType` belongs to exactly one group; group order is fixed and
/// drives the ordering of aggregated output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationGroup {
    State,
    Service,
    Template,
}

impl ValidationGroup {
    /// All groups in presentation order.
    pub const ALL: [Self; 3] = [Self::State, Self::Service, Self::Template];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::State => "state",
            Self::Service => "service",
            Self::Template => "template",
        }
    }
}

impl fmt::Display for ValidationGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// IssueType
// ---------------------------------------------------------------------------

/// The closed taxonomy of issues Vigil can report.
///
/// Membership (`FromStr`) doubles as the orphan-pruning test for persisted
/// suppression keys: a stored key whose issue type no longer parses is
/// silently dropped on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    EntityNotFound,
    EntityMissing,
    DeviceNotFound,
    AreaNotFound,
    TagNotFound,
    UnknownState,
    StateCaseMismatch,
    UnknownAttribute,
    AttributeValueOutOfSet,
    UnknownService,
    MissingRequiredField,
    UnknownServiceField,
    ServiceFieldOutOfSet,
    TemplateFieldSkipped,
    TemplateParseError,
    UnknownTemplateFilter,
    UnknownTemplateTest,
}

impl IssueType {
    /// All issue types, in group order then declaration order.
    pub const ALL: [Self; 17] = [
        Self::EntityNotFound,
        Self::EntityMissing,
        Self::DeviceNotFound,
        Self::AreaNotFound,
        Self::TagNotFound,
        Self::UnknownState,
        Self::StateCaseMismatch,
        Self::UnknownAttribute,
        Self::AttributeValueOutOfSet,
        Self::UnknownService,
        Self::MissingRequiredField,
        Self::UnknownServiceField,
        Self::ServiceFieldOutOfSet,
        Self::TemplateFieldSkipped,
        Self::TemplateParseError,
        Self::UnknownTemplateFilter,
        Self::UnknownTemplateTest,
    ];

    /// The presentation group this issue type belongs to.
    #[must_use]
    pub const fn group(self) -> ValidationGroup {
        match self {
            Self::EntityNotFound
            | Self::EntityMissing
            | Self::DeviceNotFound
            | Self::AreaNotFound
            | Self::TagNotFound
            | Self::UnknownState
            | Self::StateCaseMismatch
            | Self::UnknownAttribute
            | Self::AttributeValueOutOfSet => ValidationGroup::State,
            Self::UnknownService
            | Self::MissingRequiredField
            | Self::UnknownServiceField
            | Self::ServiceFieldOutOfSet
            | Self::TemplateFieldSkipped => ValidationGroup::Service,
            Self::TemplateParseError | Self::UnknownTemplateFilter | Self::UnknownTemplateTest => {
                ValidationGroup::Template
            }
        }
    }

    /// The severity this issue type is reported at.
    #[must_use]
    pub const fn default_severity(self) -> Severity {
        match self {
            Self::EntityNotFound
            | Self::DeviceNotFound
            | Self::AreaNotFound
            | Self::TagNotFound
            | Self::UnknownState
            | Self::UnknownService
            | Self::MissingRequiredField
            | Self::TemplateParseError => Severity::Error,
            Self::StateCaseMismatch
            | Self::UnknownAttribute
            | Self::AttributeValueOutOfSet
            | Self::UnknownServiceField
            | Self::ServiceFieldOutOfSet
            | Self::UnknownTemplateFilter
            | Self::UnknownTemplateTest => Severity::Warning,
            Self::EntityMissing | Self::TemplateFieldSkipped => Severity::Info,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EntityNotFound => "entity_not_found",
            Self::EntityMissing => "entity_missing",
            Self::DeviceNotFound => "device_not_found",
            Self::AreaNotFound => "area_not_found",
            Self::TagNotFound => "tag_not_found",
            Self::UnknownState => "unknown_state",
            Self::StateCaseMismatch => "state_case_mismatch",
            Self::UnknownAttribute => "unknown_attribute",
            Self::AttributeValueOutOfSet => "attribute_value_out_of_set",
            Self::UnknownService => "unknown_service",
            Self::MissingRequiredField => "missing_required_field",
            Self::UnknownServiceField => "unknown_service_field",
            Self::ServiceFieldOutOfSet => "service_field_out_of_set",
            Self::TemplateFieldSkipped => "template_field_skipped",
            Self::TemplateParseError => "template_parse_error",
            Self::UnknownTemplateFilter => "unknown_template_filter",
            Self::UnknownTemplateTest => "unknown_template_test",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| CoreError::UnknownIssueType(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// KnowledgeSource
// ---------------------------------------------------------------------------

/// Which source attested a value in the Knowledge Base.
///
/// Entries merge by union across sources; a learned entry is never evicted by
/// a lower-confidence source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeSource {
    DeviceClassDefault,
    SchemaIntrospection,
    Capability,
    History,
    Learned,
}

impl KnowledgeSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DeviceClassDefault => "device_class_default",
            Self::SchemaIntrospection => "schema_introspection",
            Self::Capability => "capability",
            Self::History => "history",
            Self::Learned => "learned",
        }
    }
}

impl fmt::Display for KnowledgeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    use super::{IssueType, Severity, ValidationGroup};

    #[test]
    fn severity_orders_error_highest() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
        assert_eq!(Severity::Warning.max(Severity::Error), Severity::Error);
    }

    #[test]
    fn every_issue_type_has_exactly_one_group() {
        for ty in IssueType::ALL {
            let group = ty.group();
            assert!(ValidationGroup::ALL.contains(&group));
        }
    }

    #[test]
    fn issue_type_round_trips_through_str() {
        for ty in IssueType::ALL {
            assert_eq!(IssueType::from_str(ty.as_str()).unwrap(), ty);
        }
    }

    #[test]
    fn unknown_issue_type_fails_membership() {
        assert!(IssueType::from_str("spurious_issue").is_err());
    }

    #[test]
    fn group_order_is_state_service_template() {
        assert!(ValidationGroup::State < ValidationGroup::Service);
        assert!(ValidationGroup::Service < ValidationGroup::Template);
    }
}
