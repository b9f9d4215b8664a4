//! Configuration error types

use std::io;
use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("failed to read config file '{path}': {source}")]
    IoError {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error - missing required field
    #[error("{component} '{name}' is missing required field '{field}'")]
    MissingField {
        /// Component type
        component: &'static str,
        /// Name of the component
        name: String,
        /// Missing field name
        field: &'static str,
    },

    /// Validation error - invalid value
    #[error("{component} '{name}' has invalid {field}: {message}")]
    InvalidValue {
        /// Component type
        component: &'static str,
        /// Name of the component
        name: String,
        /// Field name
        field: &'static str,
        /// Error message
        message: String,
    },

    /// Unknown dispatch mode string
    #[error("invalid mode '{0}': expected release, debug, dev or devel")]
    InvalidMode(String),

    /// No sinks enabled
    #[error("no sinks are enabled - at least one sink must be enabled")]
    NoSinksEnabled,
}

impl ConfigError {
    /// Create a MissingField error
    pub fn missing_field(component: &'static str, name: impl Into<String>, field: &'static str) -> Self {
        Self::MissingField {
            component,
            name: name.into(),
            field,
        }
    }

    /// Create an InvalidValue error
    pub fn invalid_value(
        component: &'static str,
        name: impl Into<String>,
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            component,
            name: name.into(),
            field,
            message: message.into(),
        }
    }

    /// Create an InvalidValue error for a sink field
    pub fn invalid_sink(
        name: impl Into<String>,
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::invalid_value("sink", name, field, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_value_error() {
        let err = ConfigError::invalid_sink("file", "pattern", "contains a path separator");
        assert!(err.to_string().contains("sink 'file'"));
        assert!(err.to_string().contains("pattern"));
        assert!(err.to_string().contains("path separator"));
    }

    #[test]
    fn test_missing_field_error() {
        let err = ConfigError::missing_field("sink", "file", "path");
        assert!(err.to_string().contains("missing required field 'path'"));
    }

    #[test]
    fn test_invalid_mode_error() {
        let err = ConfigError::InvalidMode("production".into());
        assert!(err.to_string().contains("production"));
    }

    #[test]
    fn test_no_sinks_enabled() {
        let err = ConfigError::NoSinksEnabled;
        assert!(err.to_string().contains("no sinks"));
    }
}
