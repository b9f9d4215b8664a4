//! Protocol error types

use thiserror::Error;

/// Errors that can occur when parsing protocol values
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// Level name not recognised
    #[error("invalid log level '{0}': expected panic, fatal, error, warn, info, verbose, debug or trace")]
    InvalidLevel(String),

    /// Numeric level out of range
    #[error("invalid log level value: {0}")]
    InvalidLevelValue(u8),
}

impl ProtocolError {
    /// Create an invalid level error
    #[inline]
    pub fn invalid_level(name: impl Into<String>) -> Self {
        Self::InvalidLevel(name.into())
    }
}
