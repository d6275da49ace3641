//! The validation engine: the long-lived service facade.
//!
//! Owns the shared knowledge handle and wires extraction, the three
//! validators, aggregation, and the stores together. Rule text in, grouped
//! report out; a check never fails, only refreshes and store writes can.

use serde::Serialize;
use std::sync::{Mutex, PoisonError};

use vigil_core::{IssueKey, Severity, ValidationIssue};
use vigil_knowledge::{
    DEFAULT_HISTORY_DAYS, HistoryProvider, KnowledgeBuilder, Registry, SharedKnowledge,
};
use vigil_rules::{Anomaly, DEFAULT_MAX_DEPTH, Extractor, Rule};
use vigil_store::{LearnedStates, Suppression, SuppressionStore};

use crate::aggregate::{GroupedIssues, aggregate};
use crate::error::EngineError;
use crate::service::{ServiceSchemaProvider, ServiceValidator};
use crate::state::StateValidator;
use crate::template::{TemplateParser, TemplateValidator};

/// Tunables carried by one engine instance.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub max_depth: usize,
    pub history_days: i64,
    pub strict_templates: bool,
    pub extra_domains: Vec<String>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            history_days: DEFAULT_HISTORY_DAYS,
            strict_templates: false,
            extra_domains: Vec::new(),
        }
    }
}

/// The complete outcome of one validation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub groups: Vec<GroupedIssues>,
    pub anomalies: Vec<Anomaly>,
    /// Distinct issue identities the suppression store silenced in this run.
    /// Suppressions that matched nothing do not count.
    pub suppressed: usize,
}

impl ValidationReport {
    /// Every surviving issue, in group order.
    pub fn issues(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.groups.iter().flat_map(|group| group.issues.iter())
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.groups.iter().map(|group| group.issues.len()).sum()
    }

    #[must_use]
    pub fn count_at(&self, severity: Severity) -> usize {
        self.issues()
            .filter(|issue| issue.severity == severity)
            .count()
    }

    /// Whether the run should fail a CI-style gate.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.issues()
            .any(|issue| issue.severity == Severity::Error)
    }
}

/// Long-lived validation service over injected host surfaces.
pub struct ValidationEngine<'a> {
    registry: &'a dyn Registry,
    history: Option<&'a dyn HistoryProvider>,
    schemas: &'a dyn ServiceSchemaProvider,
    parser: &'a dyn TemplateParser,
    suppressions: &'a SuppressionStore,
    learned: &'a LearnedStates,
    knowledge: SharedKnowledge,
    options: EngineOptions,
    last: Mutex<Option<ValidationReport>>,
}

impl<'a> ValidationEngine<'a> {
    #[must_use]
    pub fn new(
        registry: &'a dyn Registry,
        schemas: &'a dyn ServiceSchemaProvider,
        parser: &'a dyn TemplateParser,
        suppressions: &'a SuppressionStore,
        learned: &'a LearnedStates,
        options: EngineOptions,
    ) -> Self {
        Self {
            registry,
            history: None,
            schemas,
            parser,
            suppressions,
            learned,
            knowledge: SharedKnowledge::default(),
            options,
            last: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn with_history(mut self, history: &'a dyn HistoryProvider) -> Self {
        self.history = Some(history);
        self
    }

    /// Rebuild the knowledge snapshot from all sources.
    ///
    /// Concurrent checks keep the previous snapshot until the swap lands.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Knowledge`] when the rebuild fails; the
    /// previous snapshot stays installed.
    pub fn refresh(&self) -> Result<(), EngineError> {
        let mut builder = KnowledgeBuilder::new(self.registry)
            .with_learned(self.learned)
            .history_days(self.options.history_days)
            .extra_domains(self.options.extra_domains.clone());
        if let Some(history) = self.history {
            builder = builder.with_history(history);
        }
        let snapshot = self.knowledge.rebuild_with(|| Ok(builder.build()))?;
        tracing::debug!(entities = snapshot.len(), "knowledge snapshot rebuilt");
        Ok(())
    }

    /// Run one full validation pass over `rules`.
    ///
    /// The first check after construction triggers an implicit refresh so a
    /// caller that never refreshes still validates against real knowledge.
    pub fn check(&self, rules: &[Rule]) -> Result<ValidationReport, EngineError> {
        if self.knowledge.current().built_at.is_none() {
            self.refresh()?;
        }
        let snapshot = self.knowledge.current();

        let extraction = Extractor::new(self.options.max_depth).extract_all(rules);
        tracing::debug!(
            references = extraction.references.len(),
            service_calls = extraction.service_calls.len(),
            anomalies = extraction.anomalies.len(),
            "extraction complete"
        );

        let mut issues = StateValidator::new(&snapshot, self.registry)
            .validate(&extraction.references);
        issues.extend(ServiceValidator::new(self.schemas).validate(&extraction.service_calls));
        issues.extend(
            TemplateValidator::new(self.parser, self.options.strict_templates)
                .validate(&extraction.references),
        );

        let suppressed_keys = self.suppressions.active_keys();
        let raw_count = issues.len();
        let silenced = issues
            .iter()
            .map(ValidationIssue::key)
            .collect::<std::collections::BTreeSet<_>>()
            .intersection(&suppressed_keys)
            .count();
        let groups = aggregate(issues, &suppressed_keys);
        let report = ValidationReport {
            groups,
            anomalies: extraction.anomalies,
            suppressed: silenced,
        };
        tracing::info!(
            raw = raw_count,
            surviving = report.total(),
            errors = report.count_at(Severity::Error),
            "validation run complete"
        );

        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(report.clone());
        Ok(report)
    }

    /// The most recent report, if a check has run.
    #[must_use]
    pub fn last_report(&self) -> Option<ValidationReport> {
        self.last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Surviving issues from the most recent check, flat and in group order.
    #[must_use]
    pub fn current_issues(&self) -> Vec<ValidationIssue> {
        self.last_report()
            .map(|report| report.issues().cloned().collect())
            .unwrap_or_default()
    }

    /// Grouped results from the most recent check.
    #[must_use]
    pub fn grouped_results(&self) -> Vec<GroupedIssues> {
        self.last_report()
            .map(|report| report.groups)
            .unwrap_or_default()
    }

    /// Suppress an issue identity, optionally promoting a learned value.
    ///
    /// Learning writes through to the learned store and refreshes knowledge,
    /// so the value is attested from the very next check.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] when persistence fails. A failed learn
    /// rolls the just-written suppression back, so the stores never disagree.
    pub fn suppress(
        &self,
        key: IssueKey,
        learn: Option<String>,
    ) -> Result<Suppression, EngineError> {
        let suppression = self.suppressions.suppress(key.clone(), learn.clone())?;
        if let Some(value) = &learn {
            if let Err(error) = self.learned.learn(&key.subject, value) {
                let _ = self.suppressions.unsuppress(&key);
                return Err(error.into());
            }
            self.refresh()?;
        }
        Ok(suppression)
    }

    /// Remove a suppression. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] when persistence fails.
    pub fn unsuppress(&self, key: &IssueKey) -> Result<bool, EngineError> {
        Ok(self.suppressions.unsuppress(key)?)
    }

    /// All active suppressions, ordered by key.
    #[must_use]
    pub fn list_suppressions(&self) -> Vec<Suppression> {
        self.suppressions.list()
    }

    /// Drop every suppression. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] when persistence fails.
    pub fn clear_suppressions(&self) -> Result<usize, EngineError> {
        Ok(self.suppressions.clear()?)
    }
}
