//! Error types for the core module.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for sanitization.
pub type SanitizeResult<T> = Result<T, SanitizeError>;

/// Result type alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors surfaced by the sanitizer.
///
/// Shapes the sanitizer cannot interpret are not errors; they degrade to
/// their string form and show up in the [`crate::SanitizeReport`] instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SanitizeError {
    #[error("Cyclic structure detected at {path}: {type_name} refers back to itself")]
    CyclicStructure { type_name: String, path: String },

    #[error("Value nested deeper than {limit} levels at {path}")]
    DepthExceeded { limit: usize, path: String },
}

/// Failure of an object's to-mapping capability.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ConversionError(pub String);

impl ConversionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors that can occur while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path:?}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid config value for {field}: {message}")]
    Invalid { field: String, message: String },
}

impl ConfigError {
    /// Create an invalid value error.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}
