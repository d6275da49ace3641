//! The Suppression Store: persisted user decisions to silence issues.
//!
//! Suppressions are keyed by issue identity and namespaced per integration
//! instance. Keys persist as raw strings so that loading a file written
//! under an older taxonomy can prune orphans (keys whose issue type no
//! longer exists) instead of failing wholesale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use vigil_core::IssueKey;

use crate::error::StoreError;
use crate::persist::{read_or_default, write_atomic};

/// A persisted user decision to silence one issue identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suppression {
    pub key: IssueKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learned_value: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// On-disk record: the key lives in the map key string, not the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSuppression {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    learned_value: Option<String>,
    created_at: DateTime<Utc>,
}

/// Mutex-guarded, file-backed suppression map.
///
/// Every mutation persists before returning; a failed write is rolled back
/// in memory and surfaced to the caller so the UI can retry.
pub struct SuppressionStore {
    path: PathBuf,
    inner: Mutex<BTreeMap<IssueKey, Suppression>>,
}

impl SuppressionStore {
    /// Open (or create) the store for one instance namespace.
    ///
    /// Orphaned entries — keys whose issue type is no longer in the
    /// taxonomy — are silently dropped during load.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the file exists but cannot be read or is
    /// not valid JSON.
    pub fn open(dir: &Path, namespace: &str) -> Result<Self, StoreError> {
        let path = dir.join(namespace).join("suppressions.json");
        let raw: BTreeMap<String, StoredSuppression> = read_or_default(&path)?;

        let mut entries = BTreeMap::new();
        let mut pruned = 0usize;
        for (key_text, stored) in raw {
            match IssueKey::from_str(&key_text) {
                Ok(key) => {
                    entries.insert(
                        key.clone(),
                        Suppression {
                            key,
                            learned_value: stored.learned_value,
                            created_at: stored.created_at,
                        },
                    );
                }
                Err(_) => pruned += 1,
            }
        }
        if pruned > 0 {
            tracing::debug!(pruned, path = %path.display(), "pruned orphaned suppressions");
            let store = Self {
                path,
                inner: Mutex::new(entries),
            };
            store.persist_locked(&store.lock())?;
            return Ok(store);
        }

        Ok(Self {
            path,
            inner: Mutex::new(entries),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<IssueKey, Suppression>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist_locked(
        &self,
        entries: &BTreeMap<IssueKey, Suppression>,
    ) -> Result<(), StoreError> {
        let raw: BTreeMap<String, StoredSuppression> = entries
            .iter()
            .map(|(key, suppression)| {
                (
                    key.to_string(),
                    StoredSuppression {
                        learned_value: suppression.learned_value.clone(),
                        created_at: suppression.created_at,
                    },
                )
            })
            .collect();
        write_atomic(&self.path, &raw)
    }

    /// Suppress an issue identity, optionally recording a learned value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails; the in-memory state is
    /// rolled back so memory and disk stay consistent.
    pub fn suppress(
        &self,
        key: IssueKey,
        learned_value: Option<String>,
    ) -> Result<Suppression, StoreError> {
        let suppression = Suppression {
            key: key.clone(),
            learned_value,
            created_at: Utc::now(),
        };
        let mut entries = self.lock();
        let previous = entries.insert(key.clone(), suppression.clone());
        if let Err(error) = self.persist_locked(&entries) {
            match previous {
                Some(previous) => entries.insert(key, previous),
                None => entries.remove(&key),
            };
            return Err(error);
        }
        Ok(suppression)
    }

    /// Remove a suppression. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails; the entry is restored
    /// in memory.
    pub fn unsuppress(&self, key: &IssueKey) -> Result<bool, StoreError> {
        let mut entries = self.lock();
        let Some(previous) = entries.remove(key) else {
            return Ok(false);
        };
        if let Err(error) = self.persist_locked(&entries) {
            entries.insert(key.clone(), previous);
            return Err(error);
        }
        Ok(true)
    }

    /// Remove every suppression. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails; entries are restored.
    pub fn clear(&self) -> Result<usize, StoreError> {
        let mut entries = self.lock();
        let previous = std::mem::take(&mut *entries);
        let count = previous.len();
        if let Err(error) = self.persist_locked(&entries) {
            *entries = previous;
            return Err(error);
        }
        Ok(count)
    }

    #[must_use]
    pub fn contains(&self, key: &IssueKey) -> bool {
        self.lock().contains_key(key)
    }

    /// All suppressions, ordered by key.
    #[must_use]
    pub fn list(&self) -> Vec<Suppression> {
        self.lock().values().cloned().collect()
    }

    /// The active key set, for aggregator filtering.
    #[must_use]
    pub fn active_keys(&self) -> BTreeSet<IssueKey> {
        self.lock().keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
