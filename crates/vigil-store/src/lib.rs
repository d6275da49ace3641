//! # vigil-store
//!
//! Durable state for Vigil: the Suppression Store (user decisions to silence
//! specific issue identities) and the Learned-States Store (observed values
//! promoted into the Knowledge Base).
//!
//! Both stores are namespaced per integration instance, guarded by their own
//! mutex, and persist through all-or-nothing file replacement — a failed
//! write surfaces to the caller and never corrupts the previous file.

pub mod error;
pub mod learned;
mod persist;
pub mod suppression;

pub use error::StoreError;
pub use learned::LearnedStates;
pub use suppression::{Suppression, SuppressionStore};
