//! Error types for the call waiting crate
//!
//! The controller itself never surfaces these: every anomaly degrades to
//! [`CallWaitingState::NotSupported`](crate::types::CallWaitingState). They are
//! produced by the storage, configuration and service layers around it.

use thiserror::Error;

/// Result type for call waiting operations
pub type Result<T> = std::result::Result<T, CallWaitingError>;

/// Errors that can occur around the call waiting controller
#[derive(Debug, Error)]
pub enum CallWaitingError {
    /// Preference store failure
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// I/O error from a file-backed store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted document could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The per-phone service task is gone
    #[error("Call waiting service is closed")]
    ServiceClosed,

    /// Internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CallWaitingError {
    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<config::ConfigError> for CallWaitingError {
    fn from(err: config::ConfigError) -> Self {
        Self::config(err.to_string())
    }
}

impl From<toml::de::Error> for CallWaitingError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(err.to_string())
    }
}
