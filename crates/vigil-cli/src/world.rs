//! Offline world fixtures.
//!
//! One JSON file stands in for the host runtime's live surfaces: entity,
//! device, area, and tag registries, observed history, and service schemas.
//! The same format backs the integration tests.

use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

use vigil_knowledge::{InMemoryHistory, InMemoryRegistry};
use vigil_validate::InMemorySchemas;

/// Everything the validators need to know about one installation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct World {
    #[serde(default)]
    pub registry: InMemoryRegistry,
    #[serde(default)]
    pub history: InMemoryHistory,
    #[serde(default)]
    pub services: InMemorySchemas,
}

impl World {
    /// Load a world fixture from disk.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or is not a valid fixture.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read world file '{}'", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("invalid world file '{}'", path.display()))
    }
}
