//! Command implementations for the fanlog CLI

pub mod check;
pub mod pipe;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fanlog_config::{Config, ConsoleSinkConfig, SinkConfig};

/// Config files tried when `--config` is not given
const DEFAULT_CONFIG_PATHS: &[&str] = &["configs/fanlog.toml", "fanlog.toml"];

/// Load the configuration
///
/// An explicit path must exist. Without one the default paths are tried,
/// falling back to a single console sink.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        if !path.exists() {
            anyhow::bail!("config file not found: {}", path.display());
        }
        return Config::from_file(path).context("failed to load configuration");
    }

    for candidate in DEFAULT_CONFIG_PATHS.iter().map(PathBuf::from) {
        if candidate.exists() {
            return Config::from_file(&candidate)
                .with_context(|| format!("failed to load {}", candidate.display()));
        }
    }

    Ok(default_config())
}

/// Defaults plus a console sink
pub fn default_config() -> Config {
    let mut config = Config::default();
    config
        .sinks
        .insert("console", SinkConfig::Console(ConsoleSinkConfig::default()));
    config
}
