//! The Learned-States Store: user-promoted values fed back into knowledge.
//!
//! Entries are keyed by `(domain_scope, entity_id)` and namespaced per
//! integration instance. A rebuild of the Knowledge Base only ever reads and
//! unions these — a learned entry is never evicted by a lower-confidence
//! source.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use vigil_core::ids::domain_of;
use vigil_knowledge::LearnedSource;

use crate::error::StoreError;
use crate::persist::{read_or_default, write_atomic};

/// File key format: `{domain_scope}:{entity_id}`.
fn composite_key(scope: &str, entity_id: &str) -> String {
    format!("{scope}:{entity_id}")
}

/// Mutex-guarded, file-backed learned-state sets.
pub struct LearnedStates {
    path: PathBuf,
    inner: Mutex<BTreeMap<String, BTreeSet<String>>>,
}

impl LearnedStates {
    /// Open (or create) the store for one instance namespace.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the file exists but cannot be read or is
    /// not valid JSON.
    pub fn open(dir: &Path, namespace: &str) -> Result<Self, StoreError> {
        let path = dir.join(namespace).join("learned_states.json");
        let entries = read_or_default(&path)?;
        Ok(Self {
            path,
            inner: Mutex::new(entries),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, BTreeSet<String>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a learned value under the entity's domain scope.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails; the in-memory set is
    /// rolled back.
    pub fn learn(&self, entity_id: &str, value: &str) -> Result<(), StoreError> {
        let key = composite_key(domain_of(entity_id), entity_id);
        let mut entries = self.lock();
        let inserted = entries.entry(key.clone()).or_default().insert(value.to_string());
        if let Err(error) = write_atomic(&self.path, &*entries) {
            if inserted {
                if let Some(values) = entries.get_mut(&key) {
                    values.remove(value);
                    if values.is_empty() {
                        entries.remove(&key);
                    }
                }
            }
            return Err(error);
        }
        Ok(())
    }

    /// Drop a learned value. Returns whether it was present.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails; the in-memory set is
    /// rolled back.
    pub fn forget(&self, entity_id: &str, value: &str) -> Result<bool, StoreError> {
        let key = composite_key(domain_of(entity_id), entity_id);
        let mut entries = self.lock();
        let Some(values) = entries.get_mut(&key) else {
            return Ok(false);
        };
        if !values.remove(value) {
            return Ok(false);
        }
        let emptied = values.is_empty();
        if emptied {
            entries.remove(&key);
        }
        if let Err(error) = write_atomic(&self.path, &*entries) {
            entries
                .entry(key)
                .or_default()
                .insert(value.to_string());
            return Err(error);
        }
        Ok(true)
    }

    /// Every learned value for one entity, unioned across scopes.
    #[must_use]
    pub fn states_for(&self, entity_id: &str) -> BTreeSet<String> {
        let suffix = format!(":{entity_id}");
        self.lock()
            .iter()
            .filter(|(key, _)| key.ends_with(&suffix))
            .flat_map(|(_, values)| values.iter().cloned())
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }
}

impl LearnedSource for LearnedStates {
    fn learned_states(&self, entity_id: &str) -> BTreeSet<String> {
        self.states_for(entity_id)
    }
}
