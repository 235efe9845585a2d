//! Coordinator tuning

use nearby_core::config::SearchConfig;
use std::time::Duration;

/// Debounce and gating settings for a coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorSettings {
    /// Quiet period after the last edit before a search is issued
    pub debounce: Duration,
    /// Minimum trimmed query length, in characters
    pub min_query_length: usize,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self::from(&SearchConfig::default())
    }
}

impl From<&SearchConfig> for CoordinatorSettings {
    fn from(config: &SearchConfig) -> Self {
        Self {
            debounce: config.debounce_duration(),
            min_query_length: config.min_query_length,
        }
    }
}
