//! Persistence locations.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_dir() -> PathBuf {
    PathBuf::from(".vigil")
}

fn default_namespace() -> String {
    "default".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Root directory for suppression and learned-state files.
    #[serde(default = "default_dir")]
    pub dir: PathBuf,

    /// Instance namespace under the store directory.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            namespace: default_namespace(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = StoreConfig::default();
        assert_eq!(config.dir, PathBuf::from(".vigil"));
        assert_eq!(config.namespace, "default");
    }
}
