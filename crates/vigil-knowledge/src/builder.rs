//! Knowledge-base construction: merge every source into one snapshot.
//!
//! Merge order (later sources only add, never remove):
//! domain/device-class defaults → declared enum options → capability
//! introspection → bounded history → learned entries. A failing source
//! degrades to "no opinion" for its entities; the build itself never fails.

use chrono::{Duration, Utc};
use std::collections::BTreeMap;

use vigil_core::KnowledgeSource;

use crate::defaults::{UNIVERSAL_STATES, domain_default_states, is_whitelisted};
use crate::registry::{HistoryProvider, LearnedSource, Registry};
use crate::snapshot::{KnowledgeEntry, KnowledgeSnapshot};

/// Default history lookback window, in days.
pub const DEFAULT_HISTORY_DAYS: i64 = 30;

/// Builds a [`KnowledgeSnapshot`] from the injected sources.
pub struct KnowledgeBuilder<'a> {
    registry: &'a dyn Registry,
    history: Option<&'a dyn HistoryProvider>,
    learned: Option<&'a dyn LearnedSource>,
    history_days: i64,
    extra_domains: Vec<String>,
}

impl<'a> KnowledgeBuilder<'a> {
    #[must_use]
    pub fn new(registry: &'a dyn Registry) -> Self {
        Self {
            registry,
            history: None,
            learned: None,
            history_days: DEFAULT_HISTORY_DAYS,
            extra_domains: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_history(mut self, history: &'a dyn HistoryProvider) -> Self {
        self.history = Some(history);
        self
    }

    #[must_use]
    pub fn with_learned(mut self, learned: &'a dyn LearnedSource) -> Self {
        self.learned = Some(learned);
        self
    }

    #[must_use]
    pub const fn history_days(mut self, days: i64) -> Self {
        self.history_days = days;
        self
    }

    /// Extend (never replace) the built-in domain whitelist.
    #[must_use]
    pub fn extra_domains(mut self, domains: Vec<String>) -> Self {
        self.extra_domains = domains;
        self
    }

    /// Construct a complete snapshot. Infallible: source failures degrade
    /// and are logged, per the error-handling policy.
    #[must_use]
    pub fn build(&self) -> KnowledgeSnapshot {
        let now = Utc::now();
        let since = now - Duration::days(self.history_days);
        let mut entries: BTreeMap<String, KnowledgeEntry> = BTreeMap::new();

        for entity_id in self.registry.entity_ids() {
            let Some(meta) = self.registry.get_entity(&entity_id) else {
                continue;
            };
            let domain = meta.domain().to_string();
            let entry = entries.entry(entity_id.clone()).or_default();

            entry.eligible = is_whitelisted(&domain)
                || self.extra_domains.iter().any(|extra| extra == &domain)
                || meta.is_enum_sensor();

            if let Some(states) = domain_default_states(&domain) {
                entry.attest_states(KnowledgeSource::DeviceClassDefault, states.iter().copied());
                entry.attest_states(
                    KnowledgeSource::DeviceClassDefault,
                    UNIVERSAL_STATES.iter().copied(),
                );
            }

            if let Some(options) = &meta.enum_options {
                entry.attest_states(
                    KnowledgeSource::SchemaIntrospection,
                    options.iter().cloned(),
                );
            }

            if !meta.capability_states.is_empty() {
                entry.attest_states(
                    KnowledgeSource::Capability,
                    meta.capability_states.iter().cloned(),
                );
            }

            for (attribute, options) in &meta.attributes {
                let values = entry
                    .known_attributes
                    .entry(attribute.clone())
                    .or_default();
                if let Some(options) = options {
                    values.extend(options.iter().cloned());
                }
                entry.sources.insert(KnowledgeSource::SchemaIntrospection);
            }

            if let Some(history) = self.history {
                match history.observed_values(&entity_id, since) {
                    Ok(observed) => entry.attest_states(KnowledgeSource::History, observed),
                    Err(error) => {
                        tracing::warn!(entity = %entity_id, %error, "history source degraded");
                    }
                }
            }

            if let Some(learned) = self.learned {
                entry.attest_states(KnowledgeSource::Learned, learned.learned_states(&entity_id));
            }
        }

        KnowledgeSnapshot::new(entries, now)
    }
}
