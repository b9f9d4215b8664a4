//! Fanlog Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! Minimal config should just work - only specify what you need to change.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use fanlog_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[sinks.console]\ntype = \"console\"").unwrap();
//! ```
//!
//! # Example Config
//!
//! ```toml
//! [global]
//! mode = "release"
//!
//! [sinks.console]
//! type = "console"
//! level = "info"
//!
//! [sinks.file]
//! type = "file"
//! path = "logs/"
//! rotate_policy = "size"
//! rotate_size = 10485760
//! ```
//!
//! See `configs/example.toml` for all available options.

mod error;
mod global;
mod logging;
mod sinks;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use error::{ConfigError, Result};
pub use global::{GlobalConfig, Mode};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use sinks::{
    ConsoleSinkConfig, ConsoleTarget, DEFAULT_BUFFER_SIZE, DEFAULT_CHECK_INTERVAL,
    DEFAULT_CLOSE_GRACE, DEFAULT_QUEUE_SIZE, DEFAULT_ROTATE_INTERVAL, DEFAULT_ROTATE_SIZE,
    DEFAULT_SWEEP_COUNT, DEFAULT_SWEEP_INTERVAL, FileSinkConfig, FormatterKind, RotatePolicy,
    SinkConfig, SinksConfig, SweepPolicy, SyslogSinkConfig,
};

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Global settings (dispatch mode)
    pub global: GlobalConfig,

    /// fanlog's own diagnostics
    pub log: LogConfig,

    /// Named sinks
    pub sinks: SinksConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML or fails
    /// validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// Get list of enabled sink names, sorted
    pub fn enabled_sinks(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .sinks
            .iter()
            .filter(|(_, sink)| sink.is_enabled())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
