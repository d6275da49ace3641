//! The State Validator: entity existence, state values, and attributes.
//!
//! Checks run as a short-circuiting decision tree per reference: a missing
//! entity ends that reference's evaluation, a historical-only entity demotes
//! everything downstream to a single informational note, and the knowledge
//! base answering "no opinion" skips value checks entirely rather than
//! guessing.

use vigil_knowledge::{KnowledgeSnapshot, Registry};

use vigil_core::{IssueType, Reference, ReferenceKind, ValidationIssue};

use crate::suggest::nearest;

/// Validates `State`, `Attribute`, and `Registry` references against one
/// snapshot and the live registries.
pub struct StateValidator<'a> {
    snapshot: &'a KnowledgeSnapshot,
    registry: &'a dyn Registry,
}

impl<'a> StateValidator<'a> {
    #[must_use]
    pub fn new(snapshot: &'a KnowledgeSnapshot, registry: &'a dyn Registry) -> Self {
        Self { snapshot, registry }
    }

    /// Check every reference in order. Template and service references are
    /// handled by their own validators and ignored here.
    #[must_use]
    pub fn validate(&self, references: &[Reference]) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        for reference in references {
            match reference.kind {
                ReferenceKind::State | ReferenceKind::Attribute => {
                    self.check_entity(reference, &mut issues);
                }
                ReferenceKind::Registry => self.check_registry(reference, &mut issues),
                ReferenceKind::Service | ReferenceKind::Template => {}
            }
        }
        issues
    }

    fn check_entity(&self, reference: &Reference, issues: &mut Vec<ValidationIssue>) {
        let entity_id = &reference.target;
        let Some(meta) = self.registry.get_entity(entity_id) else {
            let mut issue = ValidationIssue::new(
                IssueType::EntityNotFound,
                entity_id,
                &reference.rule_id,
                &reference.path,
                format!("entity \"{entity_id}\" is not in the registry"),
            );
            let ids = self.registry.entity_ids();
            if let Some(suggestion) = nearest(entity_id, ids.iter().map(String::as_str)) {
                issue = issue.with_suggestion(suggestion);
            }
            issues.push(issue);
            return;
        };

        if meta.historical_only {
            issues.push(ValidationIssue::new(
                IssueType::EntityMissing,
                entity_id,
                &reference.rule_id,
                &reference.path,
                format!("entity \"{entity_id}\" only appears in history, not the current registry"),
            ));
            return;
        }

        match reference.kind {
            ReferenceKind::State => self.check_state_value(reference, issues),
            ReferenceKind::Attribute => self.check_attribute(reference, issues),
            _ => {}
        }
    }

    fn check_state_value(&self, reference: &Reference, issues: &mut Vec<ValidationIssue>) {
        // "No opinion" (unknown entity, open domain, gated out) means skip.
        let Some(known) = self.snapshot.known_states(&reference.target) else {
            return;
        };
        let Some(value) = reference.value.as_deref() else {
            return;
        };
        if reference.template_derived || known.is_empty() {
            return;
        }

        if known.contains(value) {
            return;
        }

        if let Some(attested) = known
            .iter()
            .find(|candidate| candidate.eq_ignore_ascii_case(value))
        {
            issues.push(
                ValidationIssue::new(
                    IssueType::StateCaseMismatch,
                    &reference.target,
                    &reference.rule_id,
                    &reference.path,
                    format!(
                        "state \"{value}\" differs from the attested \"{attested}\" only in case"
                    ),
                )
                .with_suggestion(attested.clone()),
            );
            return;
        }

        let mut issue = ValidationIssue::new(
            IssueType::UnknownState,
            &reference.target,
            &reference.rule_id,
            &reference.path,
            format!(
                "state \"{value}\" is not a known state of \"{}\"",
                reference.target
            ),
        );
        if let Some(suggestion) = nearest(value, known.iter().map(String::as_str)) {
            issue = issue.with_suggestion(suggestion);
        }
        issues.push(issue);
    }

    fn check_attribute(&self, reference: &Reference, issues: &mut Vec<ValidationIssue>) {
        let Some(attributes) = self.snapshot.known_attributes(&reference.target) else {
            return;
        };
        let Some(attribute) = reference.attribute.as_deref() else {
            return;
        };

        let Some(allowed) = attributes.get(attribute) else {
            let mut issue = ValidationIssue::new(
                IssueType::UnknownAttribute,
                &reference.target,
                &reference.rule_id,
                &reference.path,
                format!(
                    "attribute \"{attribute}\" is not declared by \"{}\"",
                    reference.target
                ),
            );
            if let Some(suggestion) = nearest(attribute, attributes.keys().map(String::as_str)) {
                issue = issue.with_suggestion(suggestion);
            }
            issues.push(issue);
            return;
        };

        // Empty set = attribute exists but takes open values.
        if allowed.is_empty() || reference.template_derived {
            return;
        }
        if let Some(value) = reference.value.as_deref() {
            if !allowed.contains(value) {
                let listed = allowed.iter().cloned().collect::<Vec<_>>().join(", ");
                issues.push(ValidationIssue::new(
                    IssueType::AttributeValueOutOfSet,
                    &reference.target,
                    &reference.rule_id,
                    &reference.path,
                    format!(
                        "value \"{value}\" for attribute \"{attribute}\" is not one of: {listed}"
                    ),
                ));
            }
        }
    }

    fn check_registry(&self, reference: &Reference, issues: &mut Vec<ValidationIssue>) {
        let id = &reference.target;
        let (issue_type, found) = match reference.domain.as_str() {
            "device" => (
                IssueType::DeviceNotFound,
                self.registry.get_device(id).is_some(),
            ),
            "area" => (IssueType::AreaNotFound, self.registry.get_area(id).is_some()),
            "tag" => (IssueType::TagNotFound, self.registry.get_tag(id).is_some()),
            _ => return,
        };
        if !found {
            issues.push(ValidationIssue::new(
                issue_type,
                id,
                &reference.rule_id,
                &reference.path,
                format!("{} \"{id}\" is not registered", reference.domain),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use std::collections::{BTreeMap, BTreeSet};

    use super::StateValidator;
    use vigil_core::{IssueType, Reference, ReferenceKind, Severity};
    use vigil_knowledge::{
        AreaMeta, EntityMeta, InMemoryHistory, InMemoryRegistry, KnowledgeBuilder,
        KnowledgeSnapshot,
    };

    fn registry() -> InMemoryRegistry {
        let mut door = EntityMeta::new("binary_sensor.door");
        door.attributes
            .insert("device_class".into(), Some(BTreeSet::from(["door".to_string()])));
        let mut old = EntityMeta::new("switch.retired");
        old.historical_only = true;
        InMemoryRegistry {
            entities: vec![
                door,
                EntityMeta::new("light.hall"),
                EntityMeta::new("sensor.temperature"),
                old,
            ],
            areas: vec![AreaMeta {
                id: "kitchen".into(),
                name: Some("Kitchen".into()),
            }],
            ..InMemoryRegistry::default()
        }
    }

    fn snapshot(registry: &InMemoryRegistry) -> KnowledgeSnapshot {
        let history = InMemoryHistory {
            observed: [(
                "binary_sensor.door".to_string(),
                BTreeSet::from(["open".to_string(), "closed".to_string()]),
            )]
            .into(),
        };
        KnowledgeBuilder::new(registry).with_history(&history).build()
    }

    fn state_ref(entity: &str, value: &str) -> Reference {
        Reference::new(ReferenceKind::State, entity, "trigger/0/to", "r1").with_value(value)
    }

    #[test]
    fn missing_entity_is_an_error_with_suggestion() {
        let registry = registry();
        let snapshot = snapshot(&registry);
        let validator = StateValidator::new(&snapshot, &registry);
        let issues = validator.validate(&[state_ref("light.hal", "on")]);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, IssueType::EntityNotFound);
        assert_eq!(issues[0].severity, Severity::Error);
        assert_eq!(issues[0].suggestion.as_deref(), Some("light.hall"));
    }

    #[test]
    fn historical_only_entity_is_informational_and_stops_there() {
        let registry = registry();
        let snapshot = snapshot(&registry);
        let validator = StateValidator::new(&snapshot, &registry);
        let issues = validator.validate(&[state_ref("switch.retired", "definitely_bogus")]);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, IssueType::EntityMissing);
        assert_eq!(issues[0].severity, Severity::Info);
    }

    #[test]
    fn open_domain_value_is_skipped_not_flagged() {
        let registry = registry();
        let snapshot = snapshot(&registry);
        let validator = StateValidator::new(&snapshot, &registry);
        // sensor without enum options: knowledge has no opinion.
        let issues = validator.validate(&[state_ref("sensor.temperature", "21.5")]);
        assert!(issues.is_empty());
    }

    #[test]
    fn case_mismatch_is_exactly_one_warning_with_attested_casing() {
        let registry = registry();
        let snapshot = snapshot(&registry);
        let validator = StateValidator::new(&snapshot, &registry);
        let issues = validator.validate(&[state_ref("binary_sensor.door", "Open")]);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, IssueType::StateCaseMismatch);
        assert_eq!(issues[0].severity, Severity::Warning);
        assert_eq!(issues[0].suggestion.as_deref(), Some("open"));
    }

    #[test]
    fn unknown_state_is_an_error_with_nearest_match() {
        let registry = registry();
        let snapshot = snapshot(&registry);
        let validator = StateValidator::new(&snapshot, &registry);
        let issues = validator.validate(&[state_ref("binary_sensor.door", "opened")]);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, IssueType::UnknownState);
        assert_eq!(issues[0].severity, Severity::Error);
        assert_eq!(issues[0].suggestion.as_deref(), Some("open"));
    }

    #[test]
    fn attested_state_passes() {
        let registry = registry();
        let snapshot = snapshot(&registry);
        let validator = StateValidator::new(&snapshot, &registry);
        assert!(validator
            .validate(&[state_ref("binary_sensor.door", "open")])
            .is_empty());
        assert!(validator
            .validate(&[state_ref("binary_sensor.door", "off")])
            .is_empty());
    }

    #[test]
    fn unknown_attribute_is_a_warning() {
        let registry = registry();
        let snapshot = snapshot(&registry);
        let validator = StateValidator::new(&snapshot, &registry);
        let reference = Reference::new(
            ReferenceKind::Attribute,
            "binary_sensor.door",
            "condition/0",
            "r1",
        )
        .with_attribute("device_clas");
        let issues = validator.validate(&[reference]);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, IssueType::UnknownAttribute);
        assert_eq!(issues[0].suggestion.as_deref(), Some("device_class"));
    }

    #[test]
    fn attribute_value_outside_closed_set_is_a_warning() {
        let registry = registry();
        let snapshot = snapshot(&registry);
        let validator = StateValidator::new(&snapshot, &registry);
        let reference = Reference::new(
            ReferenceKind::Attribute,
            "binary_sensor.door",
            "condition/0",
            "r1",
        )
        .with_attribute("device_class")
        .with_value("window");
        let issues = validator.validate(&[reference]);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, IssueType::AttributeValueOutOfSet);
        assert_eq!(issues[0].severity, Severity::Warning);
    }

    #[test]
    fn registry_references_check_their_namespace() {
        let registry = registry();
        let snapshot = snapshot(&registry);
        let validator = StateValidator::new(&snapshot, &registry);

        let known = Reference::registry("area", "kitchen", "action/0/target", "r1");
        assert!(validator.validate(&[known]).is_empty());

        let missing_area = Reference::registry("area", "attic", "action/0/target", "r1");
        let missing_device = Reference::registry("device", "abc123", "trigger/0", "r1");
        let missing_tag = Reference::registry("tag", "badge", "trigger/1", "r1");
        let issues = validator.validate(&[missing_area, missing_device, missing_tag]);
        let types: Vec<_> = issues.iter().map(|issue| issue.issue_type).collect();
        assert_eq!(
            types,
            vec![
                IssueType::AreaNotFound,
                IssueType::DeviceNotFound,
                IssueType::TagNotFound
            ]
        );
    }
}
