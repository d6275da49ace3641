//! The normalized `Reference` record produced by extraction.

use serde::{Deserialize, Serialize};

use crate::enums::ReferenceKind;
use crate::ids::domain_of;

/// A normalized pointer extracted from a rule definition.
///
/// Immutable once extracted: validators consume references, never mutate
/// them. `path` is the slash-joined position in the rule tree
/// (`trigger/0/to`), `rule_id` the owning rule's id or alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub kind: ReferenceKind,
    /// Entity id, `domain.service` id, device/area/tag id, or template text.
    pub target: String,
    /// State or attribute value constraint, when the rule declares one.
    pub value: Option<String>,
    /// Attribute name for `Attribute` references.
    pub attribute: Option<String>,
    pub path: String,
    pub rule_id: String,
    /// Domain part of `target` (empty for malformed or non-id targets).
    pub domain: String,
    /// True when the value came out of a template rather than a literal.
    /// Template-derived values are exempt from closed-set checks.
    pub template_derived: bool,
}

impl Reference {
    /// Build a reference, deriving `domain` from the target id.
    #[must_use]
    pub fn new(kind: ReferenceKind, target: impl Into<String>, path: &str, rule_id: &str) -> Self {
        let target = target.into();
        let domain = domain_of(&target).to_string();
        Self {
            kind,
            target,
            value: None,
            attribute: None,
            path: path.to_string(),
            rule_id: rule_id.to_string(),
            domain,
            template_derived: false,
        }
    }

    /// Build a `Registry` reference. `namespace` names the registry to check
    /// (`device`, `area`, or `tag`) and is stored in `domain` — registry ids
    /// are opaque and carry no domain of their own.
    #[must_use]
    pub fn registry(namespace: &str, id: impl Into<String>, path: &str, rule_id: &str) -> Self {
        let mut reference = Self::new(ReferenceKind::Registry, id, path, rule_id);
        reference.domain = namespace.to_string();
        reference
    }

    /// Attach a literal value constraint.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Attach an attribute name.
    #[must_use]
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Mark the value as template-derived.
    #[must_use]
    pub const fn template_derived(mut self) -> Self {
        self.template_derived = true;
        self
    }
}

/// A service-call reference: the call's id plus its full field map.
///
/// Service calls carry their complete data payload so the Service Validator
/// can evaluate required-field and closed-set checks, which need the set of
/// fields *present*, not just individual values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCallRef {
    /// `domain.service` id.
    pub service: String,
    /// Field name → observed value, in declaration order of first appearance.
    pub fields: std::collections::BTreeMap<String, FieldValue>,
    pub path: String,
    pub rule_id: String,
}

impl ServiceCallRef {
    #[must_use]
    pub fn new(service: impl Into<String>, path: &str, rule_id: &str) -> Self {
        Self {
            service: service.into(),
            fields: std::collections::BTreeMap::new(),
            path: path.to_string(),
            rule_id: rule_id.to_string(),
        }
    }

    /// Domain part of the service id.
    #[must_use]
    pub fn domain(&self) -> &str {
        domain_of(&self.service)
    }
}

/// One field value observed in a service call's data payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValue {
    /// Scalar literal rendered as a string, when the value was one.
    pub literal: Option<String>,
    /// True when the value contains a template expression.
    pub template_derived: bool,
    /// True when the value was a sequence.
    pub is_list: bool,
}

impl FieldValue {
    #[must_use]
    pub fn literal(value: impl Into<String>) -> Self {
        Self {
            literal: Some(value.into()),
            template_derived: false,
            is_list: false,
        }
    }

    #[must_use]
    pub const fn templated() -> Self {
        Self {
            literal: None,
            template_derived: true,
            is_list: false,
        }
    }

    #[must_use]
    pub const fn list() -> Self {
        Self {
            literal: None,
            template_derived: false,
            is_list: true,
        }
    }

    /// An opaque scalar (number, bool, nested mapping) — present but not
    /// checkable against a closed value set.
    #[must_use]
    pub const fn opaque() -> Self {
        Self {
            literal: None,
            template_derived: false,
            is_list: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{Reference, ReferenceKind};

    #[test]
    fn new_derives_domain_from_target() {
        let reference = Reference::new(
            ReferenceKind::State,
            "binary_sensor.door",
            "trigger/0",
            "rule-1",
        )
        .with_value("open");
        assert_eq!(reference.domain, "binary_sensor");
        assert_eq!(reference.value.as_deref(), Some("open"));
        assert!(!reference.template_derived);
    }

    #[test]
    fn template_targets_have_empty_domain() {
        let reference = Reference::new(
            ReferenceKind::Template,
            "{{ states('light.kitchen') }}",
            "action/0/data/brightness",
            "rule-1",
        );
        assert_eq!(reference.domain, "");
    }
}
