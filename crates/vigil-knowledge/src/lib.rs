//! # vigil-knowledge
//!
//! The Knowledge Base: merged ground truth of known states and attributes
//! per entity, aggregated from static domain tables, declared enum options,
//! capability introspection, bounded history, and learned entries.
//!
//! The merge is monotonic (set-union per source, no overwrite) and
//! conservative: entities outside the domain whitelist that do not declare
//! an enum state space always answer "no opinion".

pub mod builder;
pub mod defaults;
pub mod error;
pub mod registry;
pub mod shared;
pub mod snapshot;

pub use builder::{DEFAULT_HISTORY_DAYS, KnowledgeBuilder};
pub use defaults::{DOMAIN_WHITELIST, is_whitelisted};
pub use error::KnowledgeError;
pub use registry::{
    AreaMeta, DeviceMeta, EntityMeta, HistoryProvider, InMemoryHistory, InMemoryRegistry,
    LearnedSource, Registry, TagMeta,
};
pub use shared::SharedKnowledge;
pub use snapshot::{KnowledgeEntry, KnowledgeSnapshot};
