//! Engine tunables.
//!
//! Hosts embed these under their own configuration file and hand the
//! relevant TOML fragment to [`parse_config`]; every field has a default so
//! an empty string is a valid config.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Tunables for the mutation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Bounded undo-stack capacity; the oldest entry is evicted beyond it.
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// Quiet period after the last field edit before the autosave fires,
    /// in microseconds.
    #[serde(default = "default_debounce_us")]
    pub debounce_us: i64,

    /// Expand every root node when the tree first loads.
    #[serde(default = "default_true")]
    pub auto_expand_roots: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
            debounce_us: default_debounce_us(),
            auto_expand_roots: default_true(),
        }
    }
}

const fn default_max_history() -> usize {
    50
}

const fn default_debounce_us() -> i64 {
    2_000_000
}

const fn default_true() -> bool {
    true
}

/// Parse an [`EngineConfig`] from a TOML string.
///
/// # Errors
///
/// Returns an error when the TOML does not parse or a field has the wrong
/// type.
pub fn parse_config(content: &str) -> Result<EngineConfig> {
    toml::from_str::<EngineConfig>(content).context("Failed to parse engine config")
}
