//! Error types for the switchboard
//!
//! Query operations (history, search, scoring) never fail for unknown identifiers: they
//! return empty results. Errors are reserved for invalid input on insert, generator
//! state-machine misuse, and configuration problems.

// ----------------------------------------------------------------------------
// Specific Error Types
// ----------------------------------------------------------------------------

/// Traffic generator state-machine errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeneratorError {
    #[error("Traffic generator is already running")]
    AlreadyRunning,
    #[error("Traffic generator is not active")]
    NotActive,
    #[error("Traffic generator needs at least two known numbers (have {available})")]
    InsufficientIdentifiers { available: usize },
    #[error("Traffic generator did not exit within {waited_ms}ms")]
    JoinTimeout { waited_ms: u64 },
    #[error("Traffic generator must be started from within a Tokio runtime")]
    NoRuntime,
}

// ----------------------------------------------------------------------------
// Switchboard Error
// ----------------------------------------------------------------------------

/// Core error type for the switchboard
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SwitchboardError {
    #[error("Invalid {field}: {value:?}")]
    InvalidKey { field: &'static str, value: String },

    #[error("Unknown number: {identifier}")]
    NotFound { identifier: String },

    #[error("Generator error: {0}")]
    Generator(#[from] GeneratorError),

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },
}

// ----------------------------------------------------------------------------
// Convenience Error Constructors
// ----------------------------------------------------------------------------

impl SwitchboardError {
    /// Create an invalid key error for the named field
    pub fn invalid_key<T: Into<String>>(field: &'static str, value: T) -> Self {
        SwitchboardError::InvalidKey {
            field,
            value: value.into(),
        }
    }

    /// Create a not-found error for an identifier
    pub fn not_found<T: Into<String>>(identifier: T) -> Self {
        SwitchboardError::NotFound {
            identifier: identifier.into(),
        }
    }

    /// Create a configuration error with a reason
    pub fn config_error<T: Into<String>>(reason: T) -> Self {
        SwitchboardError::Configuration {
            reason: reason.into(),
        }
    }

    /// Whether this error comes from generator state-machine misuse
    pub fn is_generator_error(&self) -> bool {
        matches!(self, SwitchboardError::Generator(_))
    }
}

// ----------------------------------------------------------------------------
// Type Aliases
// ----------------------------------------------------------------------------

pub type Result<T> = core::result::Result<T, SwitchboardError>;
pub type SwitchboardResult<T> = Result<T>;
