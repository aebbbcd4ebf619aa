//! Error handling for the switchboard CLI

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Switchboard error: {0}")]
    Switchboard(#[from] switchboard_core::SwitchboardError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("State persistence error: {0}")]
    StatePersistence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
