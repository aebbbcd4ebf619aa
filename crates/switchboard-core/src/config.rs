//! Centralized Configuration Management
//!
//! All tunables for search, file loading and the traffic generator live here so the
//! engine and the CLI share one serde-friendly configuration tree.

use crate::{Result, SwitchboardError};
use core::time::Duration;

// ----------------------------------------------------------------------------
// Search Configuration
// ----------------------------------------------------------------------------

/// Limits used by search, autocomplete and suggestion queries
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Default maximum number of hits for a prefix search
    pub search_limit: usize,
    /// Default maximum number of autocomplete completions
    pub autocomplete_limit: usize,
    /// Candidates pulled from the prefix index before popularity ranking
    pub autocomplete_pool: usize,
    /// Number of "did you mean" suggestions
    pub suggestion_count: usize,
    /// Entries in the popularity section of a traffic report
    pub report_top_n: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            search_limit: 200,
            autocomplete_limit: 20,
            autocomplete_pool: 200,
            suggestion_count: 5,
            report_top_n: 5,
        }
    }
}

// ----------------------------------------------------------------------------
// Traffic Generator Configuration
// ----------------------------------------------------------------------------

/// Configuration for the synthetic traffic generator
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TrafficConfig {
    /// How often a paused generator re-checks its control state
    pub poll_interval_ms: u64,
    /// Bound on how long `stop` waits for the background task
    pub join_timeout_ms: u64,
    /// Probability that a synthetic call is short
    pub short_call_ratio: f64,
    pub short_call_min_secs: u64,
    pub short_call_max_secs: u64,
    pub long_call_min_secs: u64,
    pub long_call_max_secs: u64,
    /// Fraction of `duration / target_count` slept between calls
    pub throttle_factor: f64,
    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            join_timeout_ms: 5_000,
            short_call_ratio: 0.9,
            short_call_min_secs: 1,
            short_call_max_secs: 300,
            long_call_min_secs: 300,
            long_call_max_secs: 3_600,
            throttle_factor: 0.5,
            seed: None,
        }
    }
}

impl TrafficConfig {
    /// Create configuration optimized for testing
    pub fn testing() -> Self {
        Self {
            poll_interval_ms: 10,
            join_timeout_ms: 1_000,
            seed: Some(7),
            ..Self::default()
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }

    /// Pause between two generated calls for a run of `duration` and `target_count` calls
    pub fn throttle(&self, duration: Duration, target_count: u64) -> Duration {
        duration.div_f64(target_count.max(1) as f64).mul_f64(self.throttle_factor)
    }

    fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(SwitchboardError::config_error(
                "Traffic poll interval must be greater than zero",
            ));
        }
        if !(0.0..=1.0).contains(&self.short_call_ratio) {
            return Err(SwitchboardError::config_error(
                "Short call ratio must be between 0 and 1",
            ));
        }
        if self.short_call_min_secs > self.short_call_max_secs
            || self.long_call_min_secs > self.long_call_max_secs
        {
            return Err(SwitchboardError::config_error(
                "Call duration ranges must have min <= max",
            ));
        }
        if !self.throttle_factor.is_finite() || self.throttle_factor < 0.0 {
            return Err(SwitchboardError::config_error(
                "Throttle factor must be a non-negative number",
            ));
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Load Configuration
// ----------------------------------------------------------------------------

/// Options for bulk loading phonebook and call files
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Maximum number of call lines replayed at startup
    pub call_limit: Option<usize>,
    /// Whether the first phonebook line is a header
    pub phonebook_has_header: bool,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            call_limit: Some(50_000),
            phonebook_has_header: true,
        }
    }
}

// ----------------------------------------------------------------------------
// Master Configuration
// ----------------------------------------------------------------------------

/// Master configuration struct for the switchboard engine
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SwitchboardConfig {
    pub search: SearchConfig,
    pub traffic: TrafficConfig,
    pub load: LoadConfig,
}

impl SwitchboardConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create configuration optimized for testing
    pub fn testing() -> Self {
        Self {
            traffic: TrafficConfig::testing(),
            load: LoadConfig {
                call_limit: None,
                phonebook_has_header: false,
            },
            ..Self::default()
        }
    }

    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    pub fn with_traffic(mut self, traffic: TrafficConfig) -> Self {
        self.traffic = traffic;
        self
    }

    pub fn with_load(mut self, load: LoadConfig) -> Self {
        self.load = load;
        self
    }

    /// Validate the whole configuration tree
    pub fn validate(&self) -> Result<()> {
        if self.search.autocomplete_pool < self.search.autocomplete_limit {
            return Err(SwitchboardError::config_error(
                "Autocomplete pool must be at least the autocomplete limit",
            ));
        }
        self.traffic.validate()
    }
}
