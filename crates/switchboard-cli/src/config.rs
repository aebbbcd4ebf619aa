//! Switchboard CLI Configuration
//!
//! Loads an optional TOML file holding the data file locations and the engine
//! configuration. Missing sections and keys fall back to their defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use switchboard_core::SwitchboardConfig;

use crate::error::{CliError, Result};

// ----------------------------------------------------------------------------
// CLI Application Configuration
// ----------------------------------------------------------------------------

/// Complete configuration for the CLI application
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Input data files
    pub paths: DataPaths,
    /// Engine tunables
    pub engine: SwitchboardConfig,
}

/// Locations of the phonebook, call and blocked-number files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataPaths {
    pub phonebook: PathBuf,
    pub calls: PathBuf,
    pub blocked: PathBuf,
}

impl Default for DataPaths {
    fn default() -> Self {
        Self {
            phonebook: PathBuf::from("phones.txt"),
            calls: PathBuf::from("calls.txt"),
            blocked: PathBuf::from("blocked.txt"),
        }
    }
}

// ----------------------------------------------------------------------------
// Configuration Loading Logic
// ----------------------------------------------------------------------------

impl AppConfig {
    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            CliError::Config(format!(
                "Failed to read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml(&text)
    }

    /// Parse and validate configuration text
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.engine
            .validate()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    /// Create example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| "# Failed to generate example config".to_string())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
