//! Retrieval configuration — thresholds and result limits, overridable
//! from `{data_dir}/config.json`. Every field has a default so a partial
//! file is fine; a broken file falls back to defaults and never blocks
//! retrieval.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    CONTEXT_MAX_RESULTS, CONTEXT_THRESHOLD, RECALL_MAX_RESULTS, RECALL_THRESHOLD,
    RECENT_DEFAULT_LIMIT, SEARCH_MAX_RESULTS, SEARCH_THRESHOLD,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Minimum combined score for `search_similar`.
    #[serde(default = "default_search_threshold")]
    pub search_threshold: f64,
    #[serde(default = "default_search_max_results")]
    pub search_max_results: usize,

    /// Stricter threshold for "have I seen this before" checks.
    #[serde(default = "default_recall_threshold")]
    pub recall_threshold: f64,
    #[serde(default = "default_recall_max_results")]
    pub recall_max_results: usize,

    /// Threshold used when digesting conversation context.
    #[serde(default = "default_context_threshold")]
    pub context_threshold: f64,
    #[serde(default = "default_context_max_results")]
    pub context_max_results: usize,

    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
}

fn default_search_threshold() -> f64 {
    SEARCH_THRESHOLD
}
fn default_search_max_results() -> usize {
    SEARCH_MAX_RESULTS
}
fn default_recall_threshold() -> f64 {
    RECALL_THRESHOLD
}
fn default_recall_max_results() -> usize {
    RECALL_MAX_RESULTS
}
fn default_context_threshold() -> f64 {
    CONTEXT_THRESHOLD
}
fn default_context_max_results() -> usize {
    CONTEXT_MAX_RESULTS
}
fn default_recent_limit() -> usize {
    RECENT_DEFAULT_LIMIT
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            search_threshold: default_search_threshold(),
            search_max_results: default_search_max_results(),
            recall_threshold: default_recall_threshold(),
            recall_max_results: default_recall_max_results(),
            context_threshold: default_context_threshold(),
            context_max_results: default_context_max_results(),
            recent_limit: default_recent_limit(),
        }
    }
}

impl RetrievalConfig {
    /// Load from a JSON file, falling back to defaults when the file is
    /// absent, unreadable, or invalid.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Invalid config file, using defaults");
                Self::default()
            }),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Unreadable config file, using defaults");
                Self::default()
            }
        }
    }
}
