//! Registry and history query surfaces.
//!
//! These traits are the seams to the host runtime's live registries. The
//! in-memory implementations back tests and the CLI's offline world fixtures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use vigil_core::ids::domain_of;

use crate::error::KnowledgeError;

/// Capability metadata for one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMeta {
    pub entity_id: String,
    #[serde(default)]
    pub device_class: Option<String>,
    /// Declared options for `device_class: enum` sensors.
    #[serde(default)]
    pub enum_options: Option<Vec<String>>,
    /// Attribute name → closed valid-value set, when one is declared.
    /// `None` means the attribute exists but takes open values.
    #[serde(default)]
    pub attributes: BTreeMap<String, Option<BTreeSet<String>>>,
    /// Feature states contributed by capability introspection
    /// (e.g. a cover's supported positions).
    #[serde(default)]
    pub capability_states: BTreeSet<String>,
    /// The entity appears in history but not in the current registry.
    #[serde(default)]
    pub historical_only: bool,
}

impl EntityMeta {
    #[must_use]
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn domain(&self) -> &str {
        domain_of(&self.entity_id)
    }

    /// Whether this entity declares a closed enum state space.
    #[must_use]
    pub fn is_enum_sensor(&self) -> bool {
        self.enum_options.is_some() || self.device_class.as_deref() == Some("enum")
    }
}

/// A device registry entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceMeta {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// An area registry entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaMeta {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A tag registry entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagMeta {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Read-only query surface over the host's entity/device/area/tag registries.
pub trait Registry {
    fn get_entity(&self, entity_id: &str) -> Option<EntityMeta>;
    fn get_device(&self, device_id: &str) -> Option<DeviceMeta>;
    fn get_area(&self, area_id: &str) -> Option<AreaMeta>;
    fn get_tag(&self, tag_id: &str) -> Option<TagMeta>;
    /// All registered entity ids, for knowledge-base enumeration.
    fn entity_ids(&self) -> Vec<String>;
}

/// Bounded historical-observation query surface.
///
/// Potentially slow (delegates to the host's recorder); the knowledge builder
/// calls it outside any lock.
pub trait HistoryProvider {
    /// Every state value observed for `entity_id` since `since`.
    ///
    /// # Errors
    ///
    /// Returns [`KnowledgeError::SourceUnavailable`] when history cannot be
    /// queried; the builder degrades that entity to "no opinion" from this
    /// source.
    fn observed_values(
        &self,
        entity_id: &str,
        since: DateTime<Utc>,
    ) -> Result<BTreeSet<String>, KnowledgeError>;
}

/// Learned-state read surface, keyed by `(domain_scope, entity_id)`.
///
/// Implemented by the learned-states store; defined here so the knowledge
/// builder does not depend on the persistence crate.
pub trait LearnedSource {
    /// Learned values for one entity, unioned across scopes.
    fn learned_states(&self, entity_id: &str) -> BTreeSet<String>;
}

// ---------------------------------------------------------------------------
// In-memory implementations
// ---------------------------------------------------------------------------

/// Fixture-backed registry for tests and offline CLI runs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InMemoryRegistry {
    #[serde(default)]
    pub entities: Vec<EntityMeta>,
    #[serde(default)]
    pub devices: Vec<DeviceMeta>,
    #[serde(default)]
    pub areas: Vec<AreaMeta>,
    #[serde(default)]
    pub tags: Vec<TagMeta>,
}

impl Registry for InMemoryRegistry {
    fn get_entity(&self, entity_id: &str) -> Option<EntityMeta> {
        self.entities
            .iter()
            .find(|meta| meta.entity_id == entity_id)
            .cloned()
    }

    fn get_device(&self, device_id: &str) -> Option<DeviceMeta> {
        self.devices.iter().find(|meta| meta.id == device_id).cloned()
    }

    fn get_area(&self, area_id: &str) -> Option<AreaMeta> {
        self.areas.iter().find(|meta| meta.id == area_id).cloned()
    }

    fn get_tag(&self, tag_id: &str) -> Option<TagMeta> {
        self.tags.iter().find(|meta| meta.id == tag_id).cloned()
    }

    fn entity_ids(&self) -> Vec<String> {
        self.entities
            .iter()
            .map(|meta| meta.entity_id.clone())
            .collect()
    }
}

/// Fixture-backed history: a fixed observed-value set per entity.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InMemoryHistory {
    #[serde(flatten)]
    pub observed: BTreeMap<String, BTreeSet<String>>,
}

impl HistoryProvider for InMemoryHistory {
    fn observed_values(
        &self,
        entity_id: &str,
        _since: DateTime<Utc>,
    ) -> Result<BTreeSet<String>, KnowledgeError> {
        Ok(self.observed.get(entity_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{EntityMeta, InMemoryRegistry, Registry};

    #[test]
    fn enum_sensor_detection() {
        let mut meta = EntityMeta::new("sensor.mode");
        assert!(!meta.is_enum_sensor());
        meta.enum_options = Some(vec!["eco".into(), "boost".into()]);
        assert!(meta.is_enum_sensor());

        let mut by_class = EntityMeta::new("sensor.other");
        by_class.device_class = Some("enum".into());
        assert!(by_class.is_enum_sensor());
    }

    #[test]
    fn in_memory_registry_lookups() {
        let registry = InMemoryRegistry {
            entities: vec![EntityMeta::new("light.hall")],
            ..InMemoryRegistry::default()
        };
        assert!(registry.get_entity("light.hall").is_some());
        assert!(registry.get_entity("light.missing").is_none());
        assert_eq!(registry.entity_ids(), vec!["light.hall".to_string()]);
    }
}
