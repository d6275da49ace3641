//! The Service Validator: call ids, required fields, and closed value sets.
//!
//! Field-level findings carry a synthetic `{call_path}/data/{field}` path so
//! two problems in one call keep distinct identities.

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

use vigil_core::{IssueType, ServiceCallRef, ValidationIssue};

use crate::suggest::nearest;

/// Declared schema for one service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServiceSchema {
    /// Fields that must be present in every call.
    #[serde(default)]
    pub required: BTreeSet<String>,
    /// Declared field name → per-field schema.
    #[serde(default)]
    pub fields: BTreeMap<String, FieldSchema>,
    /// Capability-gated fields: valid for some targets only, so their
    /// presence is never flagged even when undeclared for this target.
    #[serde(default)]
    pub conditional: BTreeSet<String>,
}

/// Declared schema for one service field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FieldSchema {
    /// Closed value set for select-style fields.
    #[serde(default)]
    pub select_options: Option<BTreeSet<String>>,
}

/// Seam to the host's service schema introspection.
pub trait ServiceSchemaProvider {
    fn get_schema(&self, domain: &str, service: &str) -> Option<ServiceSchema>;
    /// All known `domain.service` ids, for suggestions.
    fn service_ids(&self) -> Vec<String>;
}

/// Fixture-backed schema provider for tests and offline CLI runs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InMemorySchemas {
    /// `domain.service` id → schema.
    #[serde(flatten)]
    pub services: BTreeMap<String, ServiceSchema>,
}

impl ServiceSchemaProvider for InMemorySchemas {
    fn get_schema(&self, domain: &str, service: &str) -> Option<ServiceSchema> {
        self.services.get(&format!("{domain}.{service}")).cloned()
    }

    fn service_ids(&self) -> Vec<String> {
        self.services.keys().cloned().collect()
    }
}

/// Validates service calls against declared schemas.
pub struct ServiceValidator<'a> {
    schemas: &'a dyn ServiceSchemaProvider,
}

impl<'a> ServiceValidator<'a> {
    #[must_use]
    pub fn new(schemas: &'a dyn ServiceSchemaProvider) -> Self {
        Self { schemas }
    }

    /// Check every call in order.
    #[must_use]
    pub fn validate(&self, calls: &[ServiceCallRef]) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        for call in calls {
            self.check_call(call, &mut issues);
        }
        issues
    }

    fn check_call(&self, call: &ServiceCallRef, issues: &mut Vec<ValidationIssue>) {
        let Some((domain, service)) = call.service.split_once('.') else {
            issues.push(ValidationIssue::new(
                IssueType::UnknownService,
                &call.service,
                &call.rule_id,
                &call.path,
                format!("\"{}\" is not a domain.service id", call.service),
            ));
            return;
        };
        let Some(schema) = self.schemas.get_schema(domain, service) else {
            let ids = self.schemas.service_ids();
            let mut issue = ValidationIssue::new(
                IssueType::UnknownService,
                &call.service,
                &call.rule_id,
                &call.path,
                format!("service \"{}\" does not exist", call.service),
            );
            if let Some(suggestion) = nearest(&call.service, ids.iter().map(String::as_str)) {
                issue = issue.with_suggestion(suggestion);
            }
            issues.push(issue);
            return;
        };

        for required in &schema.required {
            if !call.fields.contains_key(required) {
                issues.push(ValidationIssue::new(
                    IssueType::MissingRequiredField,
                    &call.service,
                    &call.rule_id,
                    &format!("{}/data/{required}", call.path),
                    format!(
                        "required field \"{required}\" is missing from the \"{}\" call",
                        call.service
                    ),
                ));
            }
        }

        for (field, value) in &call.fields {
            let field_path = format!("{}/data/{field}", call.path);
            let Some(field_schema) = schema.fields.get(field) else {
                if schema.conditional.contains(field) || schema.required.contains(field) {
                    continue;
                }
                let mut issue = ValidationIssue::new(
                    IssueType::UnknownServiceField,
                    &call.service,
                    &call.rule_id,
                    &field_path,
                    format!(
                        "field \"{field}\" is not declared by \"{}\"",
                        call.service
                    ),
                );
                if let Some(suggestion) =
                    nearest(field, schema.fields.keys().map(String::as_str))
                {
                    issue = issue.with_suggestion(suggestion);
                }
                issues.push(issue);
                continue;
            };

            if value.template_derived {
                issues.push(ValidationIssue::new(
                    IssueType::TemplateFieldSkipped,
                    &call.service,
                    &call.rule_id,
                    &field_path,
                    format!("field \"{field}\" is template-derived and was not value-checked"),
                ));
                continue;
            }

            if let (Some(options), Some(literal)) =
                (field_schema.select_options.as_ref(), value.literal.as_deref())
            {
                if !value.is_list && !options.contains(literal) {
                    let listed = options.iter().cloned().collect::<Vec<_>>().join(", ");
                    issues.push(ValidationIssue::new(
                        IssueType::ServiceFieldOutOfSet,
                        &call.service,
                        &call.rule_id,
                        &field_path,
                        format!("value \"{literal}\" for \"{field}\" is not one of: {listed}"),
                    ));
                }
            }
        }
    }
}
