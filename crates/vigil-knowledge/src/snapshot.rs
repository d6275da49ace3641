//! Immutable knowledge snapshots.
//!
//! A snapshot is built wholesale by [`crate::builder::KnowledgeBuilder`] and
//! never mutated afterwards; validators hold the snapshot they started with
//! for a whole run. Merging is monotonic set-union per entity per source —
//! a value is "known" if any source attests it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use vigil_core::KnowledgeSource;

/// Merged truth for one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KnowledgeEntry {
    pub known_states: BTreeSet<String>,
    /// Attribute name → closed valid-value set (empty set = open values).
    pub known_attributes: BTreeMap<String, BTreeSet<String>>,
    pub sources: BTreeSet<KnowledgeSource>,
    /// Conservative-mode gate: when false, every query answers "no opinion"
    /// even though data may exist.
    pub eligible: bool,
}

impl KnowledgeEntry {
    /// Union a set of states in under the given source.
    pub fn attest_states<I, S>(&mut self, source: KnowledgeSource, states: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut any = false;
        for state in states {
            self.known_states.insert(state.into());
            any = true;
        }
        if any {
            self.sources.insert(source);
        }
    }
}

/// One consistent, queryable view of "what is actually true".
#[derive(Debug, Clone, Default, Serialize)]
pub struct KnowledgeSnapshot {
    entries: BTreeMap<String, KnowledgeEntry>,
    pub built_at: Option<DateTime<Utc>>,
}

impl KnowledgeSnapshot {
    #[must_use]
    pub fn new(entries: BTreeMap<String, KnowledgeEntry>, built_at: DateTime<Utc>) -> Self {
        Self {
            entries,
            built_at: Some(built_at),
        }
    }

    /// The known state set for an entity, or `None` for "no opinion".
    ///
    /// "No opinion" covers unknown entities *and* entities gated out by
    /// conservative mode; validators must skip, not flag, on `None`.
    #[must_use]
    pub fn known_states(&self, entity_id: &str) -> Option<&BTreeSet<String>> {
        let entry = self.entries.get(entity_id)?;
        if !entry.eligible {
            return None;
        }
        Some(&entry.known_states)
    }

    /// Whether `value` is attested for the entity. False when the snapshot
    /// has no opinion — callers that need to distinguish use
    /// [`Self::known_states`].
    #[must_use]
    pub fn is_known_state(&self, entity_id: &str, value: &str) -> bool {
        self.known_states(entity_id)
            .is_some_and(|states| states.contains(value))
    }

    /// Known attributes for an entity, or `None` for "no opinion".
    #[must_use]
    pub fn known_attributes(&self, entity_id: &str) -> Option<&BTreeMap<String, BTreeSet<String>>> {
        let entry = self.entries.get(entity_id)?;
        if !entry.eligible {
            return None;
        }
        Some(&entry.known_attributes)
    }

    /// Raw entry access (both eligible and gated entries).
    #[must_use]
    pub fn entry(&self, entity_id: &str) -> Option<&KnowledgeEntry> {
        self.entries.get(entity_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
