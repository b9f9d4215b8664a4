//! Configuration validation
//!
//! Runs after parsing:
//! - At least one sink is enabled
//! - File sinks have a path, non-zero sizes and a usable pattern
//! - Syslog addresses use a known scheme

use crate::Config;
use crate::error::{ConfigError, Result};
use crate::sinks::{FileSinkConfig, RotatePolicy, SinkConfig, SyslogSinkConfig};

/// Address schemes accepted by the syslog sink
const SYSLOG_SCHEMES: &[&str] = &["tcp", "udp", "unix"];

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_sinks(config)
}

/// Validate sink configurations
fn validate_sinks(config: &Config) -> Result<()> {
    if !config.sinks.is_empty() && config.enabled_sinks().is_empty() {
        return Err(ConfigError::NoSinksEnabled);
    }

    for (name, sink) in config.sinks.iter() {
        if !sink.is_enabled() {
            continue;
        }

        match sink {
            SinkConfig::File(file) => validate_file(name, file)?,
            SinkConfig::Syslog(syslog) => validate_syslog(name, syslog)?,
            SinkConfig::Console(_) => {}
        }
    }

    Ok(())
}

fn validate_file(name: &str, file: &FileSinkConfig) -> Result<()> {
    if file.path.is_empty() {
        return Err(ConfigError::missing_field("sink", name, "path"));
    }

    if let Some(pattern) = &file.pattern {
        validate_pattern(name, pattern)?;
    }

    if file.rotate_policy == RotatePolicy::Size && file.rotate_size == 0 {
        return Err(ConfigError::invalid_sink(name, "rotate_size", "must be greater than 0"));
    }
    if file.rotate_policy == RotatePolicy::Duration && file.rotate_interval.is_zero() {
        return Err(ConfigError::invalid_sink(name, "rotate_interval", "must be greater than 0"));
    }
    if file.buffer_size == 0 {
        return Err(ConfigError::invalid_sink(name, "buffer_size", "must be greater than 0"));
    }
    if file.queue_size == 0 {
        return Err(ConfigError::invalid_sink(name, "queue_size", "must be greater than 0"));
    }
    if file.check_interval.is_zero() {
        return Err(ConfigError::invalid_sink(name, "check_interval", "must be greater than 0"));
    }

    Ok(())
}

/// Patterns name a file inside the sink directory and carry one wildcard at most
fn validate_pattern(name: &str, pattern: &str) -> Result<()> {
    if pattern.is_empty() {
        return Err(ConfigError::invalid_sink(name, "pattern", "must not be empty"));
    }
    if pattern.contains(['/', '\\']) {
        return Err(ConfigError::invalid_sink(
            name,
            "pattern",
            "must not contain a path separator",
        ));
    }
    if pattern.matches('*').count() > 1 {
        return Err(ConfigError::invalid_sink(
            name,
            "pattern",
            "must contain at most one '*'",
        ));
    }
    Ok(())
}

fn validate_syslog(name: &str, syslog: &SyslogSinkConfig) -> Result<()> {
    if let Some((scheme, rest)) = syslog.address.split_once("://") {
        if !SYSLOG_SCHEMES.contains(&scheme) {
            return Err(ConfigError::invalid_sink(
                name,
                "address",
                format!("unknown scheme '{scheme}', expected one of: {}", SYSLOG_SCHEMES.join(", ")),
            ));
        }
        if rest.is_empty() {
            return Err(ConfigError::invalid_sink(name, "address", "missing host or path"));
        }
    }

    if syslog.queue_size == 0 {
        return Err(ConfigError::invalid_sink(name, "queue_size", "must be greater than 0"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_valid_config() {
        let toml = r#"
[sinks.console]
type = "console"

[sinks.file]
type = "file"
path = "logs"
pattern = "app-*"
"#;
        assert!(Config::from_str(toml).is_ok());
    }

    #[test]
    fn test_all_sinks_disabled() {
        let toml = r#"
[sinks.console]
type = "console"
enabled = false
"#;
        let result = Config::from_str(toml);
        assert!(matches!(result, Err(ConfigError::NoSinksEnabled)));
    }

    #[test]
    fn test_file_missing_path() {
        let toml = r#"
[sinks.file]
type = "file"
path = ""
"#;
        let result = Config::from_str(toml);
        assert!(matches!(result, Err(ConfigError::MissingField { field: "path", .. })));
    }

    #[test]
    fn test_pattern_with_separator() {
        let toml = r#"
[sinks.file]
type = "file"
pattern = "sub/app-*"
"#;
        let err = Config::from_str(toml).unwrap_err();
        assert!(err.to_string().contains("path separator"));
    }

    #[test]
    fn test_pattern_with_two_wildcards() {
        let toml = r#"
[sinks.file]
type = "file"
pattern = "app-*-*"
"#;
        let err = Config::from_str(toml).unwrap_err();
        assert!(err.to_string().contains("at most one"));
    }

    #[test]
    fn test_zero_rotate_size() {
        let toml = r#"
[sinks.file]
type = "file"
rotate_policy = "size"
rotate_size = 0
"#;
        let err = Config::from_str(toml).unwrap_err();
        assert!(err.to_string().contains("rotate_size"));
    }

    #[test]
    fn test_zero_rotate_size_ignored_for_duration() {
        let toml = r#"
[sinks.file]
type = "file"
rotate_policy = "duration"
rotate_size = 0
"#;
        assert!(Config::from_str(toml).is_ok());
    }

    #[test]
    fn test_zero_buffer_size() {
        let toml = r#"
[sinks.file]
type = "file"
buffer_size = 0
"#;
        let err = Config::from_str(toml).unwrap_err();
        assert!(err.to_string().contains("buffer_size"));
    }

    #[test]
    fn test_syslog_unknown_scheme() {
        let toml = r#"
[sinks.syslog]
type = "syslog"
address = "http://localhost:514"
"#;
        let err = Config::from_str(toml).unwrap_err();
        assert!(err.to_string().contains("unknown scheme 'http'"));
    }

    #[test]
    fn test_syslog_accepts_known_forms() {
        for address in ["", "localhost:514", "udp://127.0.0.1:514", "tcp://log:601", "unix:///dev/log"] {
            let toml = format!("[sinks.syslog]\ntype = \"syslog\"\naddress = \"{address}\"\n");
            assert!(Config::from_str(&toml).is_ok(), "rejected {address}");
        }
    }

    #[test]
    fn test_disabled_sink_not_validated() {
        let toml = r#"
[sinks.console]
type = "console"

[sinks.file]
type = "file"
enabled = false
buffer_size = 0
"#;
        assert!(Config::from_str(toml).is_ok());
    }
}
