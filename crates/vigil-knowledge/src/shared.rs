//! Swappable shared snapshot handle.
//!
//! Readers clone an `Arc` and keep their snapshot for a whole validation run
//! (copy-on-rebuild, no reader locking). The write path is single-writer: the
//! new snapshot is constructed fully outside the lock, then swapped in. A
//! failed rebuild leaves the previous snapshot in place — stale but valid,
//! never empty.

use std::sync::{Arc, PoisonError, RwLock};

use crate::error::KnowledgeError;
use crate::snapshot::KnowledgeSnapshot;

/// Shared, atomically-swappable knowledge snapshot.
#[derive(Debug, Default)]
pub struct SharedKnowledge {
    inner: RwLock<Arc<KnowledgeSnapshot>>,
}

impl SharedKnowledge {
    #[must_use]
    pub fn new(initial: KnowledgeSnapshot) -> Self {
        Self {
            inner: RwLock::new(Arc::new(initial)),
        }
    }

    /// The current snapshot. Callers hold the returned `Arc` for the
    /// duration of their run.
    #[must_use]
    pub fn current(&self) -> Arc<KnowledgeSnapshot> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Install a fully-built snapshot.
    pub fn install(&self, snapshot: KnowledgeSnapshot) -> Arc<KnowledgeSnapshot> {
        let snapshot = Arc::new(snapshot);
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = snapshot.clone();
        snapshot
    }

    /// Rebuild via `build`, swapping only on success.
    ///
    /// `build` runs outside the lock; concurrent readers keep seeing the
    /// previous snapshot until the swap.
    ///
    /// # Errors
    ///
    /// Propagates the build error; the previous snapshot stays installed.
    pub fn rebuild_with<F>(&self, build: F) -> Result<Arc<KnowledgeSnapshot>, KnowledgeError>
    where
        F: FnOnce() -> Result<KnowledgeSnapshot, KnowledgeError>,
    {
        let snapshot = build()?;
        Ok(self.install(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use std::collections::BTreeMap;

    use super::SharedKnowledge;
    use crate::error::KnowledgeError;
    use crate::snapshot::{KnowledgeEntry, KnowledgeSnapshot};

    fn snapshot_of(entity: &str) -> KnowledgeSnapshot {
        let mut entries = BTreeMap::new();
        entries.insert(
            entity.to_string(),
            KnowledgeEntry {
                eligible: true,
                ..KnowledgeEntry::default()
            },
        );
        KnowledgeSnapshot::new(entries, Utc::now())
    }

    #[test]
    fn readers_keep_their_snapshot_across_swaps() {
        let shared = SharedKnowledge::new(snapshot_of("light.old"));
        let held = shared.current();
        shared.install(snapshot_of("light.new"));
        assert!(held.entry("light.old").is_some());
        assert!(shared.current().entry("light.new").is_some());
    }

    #[test]
    fn failed_rebuild_keeps_previous_snapshot() {
        let shared = SharedKnowledge::new(snapshot_of("light.stable"));
        let result = shared.rebuild_with(|| {
            Err(KnowledgeError::SourceUnavailable {
                name: "registry",
                detail: "gone".into(),
            })
        });
        assert!(result.is_err());
        assert!(shared.current().entry("light.stable").is_some());
    }
}
