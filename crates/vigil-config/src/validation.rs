//! Validation tunables.

use serde::{Deserialize, Serialize};

use vigil_knowledge::DEFAULT_HISTORY_DAYS;
use vigil_rules::DEFAULT_MAX_DEPTH;

const fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

const fn default_history_days() -> i64 {
    DEFAULT_HISTORY_DAYS
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ValidationConfig {
    /// Maximum rule-tree descent depth before truncation.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// History lookback window, in days.
    #[serde(default = "default_history_days")]
    pub history_days: i64,

    /// Check template filter/test names against the bundled catalog.
    #[serde(default)]
    pub strict_templates: bool,

    /// Domains validated in addition to the built-in whitelist.
    #[serde(default)]
    pub extra_domains: Vec<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            history_days: default_history_days(),
            strict_templates: false,
            extra_domains: Vec::new(),
        }
    }
}
