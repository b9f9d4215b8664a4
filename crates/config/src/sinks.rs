//! Sink configuration
//!
//! Each named table under `[sinks]` declares one sink instance. The `type`
//! key selects the implementation.
//!
//! # Example
//!
//! ```toml
//! [sinks.console]
//! type = "console"
//! level = "debug"
//!
//! [sinks.file]
//! type = "file"
//! path = "logs"
//! rotate_policy = "size"
//! rotate_size = 10485760
//! ```

use std::collections::HashMap;
use std::time::Duration;

use fanlog_protocol::Level;
use serde::Deserialize;

/// Default size threshold for size-based rotation (50 MiB)
pub const DEFAULT_ROTATE_SIZE: u64 = 50 * 1024 * 1024;

/// Default interval for duration-based rotation
pub const DEFAULT_ROTATE_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default number of archives kept by count-based sweeping
pub const DEFAULT_SWEEP_COUNT: usize = 5;

/// Default maximum archive age for age-based sweeping
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Default in-memory buffer size of the file sink
pub const DEFAULT_BUFFER_SIZE: usize = 2 * 1024;

/// Default capacity of a sink's message queue
pub const DEFAULT_QUEUE_SIZE: usize = 8;

/// Default period of the rotation check
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Default time `close()` waits for the background task
pub const DEFAULT_CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Collection of named sink configurations
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SinksConfig {
    /// Named sink instances
    #[serde(flatten)]
    sinks: HashMap<String, SinkConfig>,
}

impl SinksConfig {
    /// Get a sink by name
    pub fn get(&self, name: &str) -> Option<&SinkConfig> {
        self.sinks.get(name)
    }

    /// Check if a sink exists
    pub fn contains(&self, name: &str) -> bool {
        self.sinks.contains_key(name)
    }

    /// Iterate over all sinks
    pub fn iter(&self) -> impl Iterator<Item = (&String, &SinkConfig)> {
        self.sinks.iter()
    }

    /// Get the number of configured sinks
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Check if no sinks are configured
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Get all sink names
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.sinks.keys()
    }

    /// Add or replace a sink
    pub fn insert(&mut self, name: impl Into<String>, sink: SinkConfig) {
        self.sinks.insert(name.into(), sink);
    }
}

/// Configuration for a single sink instance
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SinkConfig {
    /// Console sink - colored lines on stdout or stderr
    Console(ConsoleSinkConfig),

    /// File sink - buffered, rotating, archiving
    File(FileSinkConfig),

    /// Syslog sink - RFC 3164 style frames over udp, tcp or a unix socket
    Syslog(SyslogSinkConfig),
}

impl SinkConfig {
    /// Check if the sink is enabled
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::Console(c) => c.enabled,
            Self::File(c) => c.enabled,
            Self::Syslog(c) => c.enabled,
        }
    }

    /// Severity threshold of the sink
    pub fn level(&self) -> Level {
        match self {
            Self::Console(c) => c.level,
            Self::File(c) => c.level,
            Self::Syslog(c) => c.level,
        }
    }

    /// Formatter selection of the sink
    pub fn formatter(&self) -> FormatterKind {
        match self {
            Self::Console(c) => c.formatter,
            Self::File(c) => c.formatter,
            Self::Syslog(c) => c.formatter,
        }
    }

    /// Get the sink type name
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Console(_) => "console",
            Self::File(_) => "file",
            Self::Syslog(_) => "syslog",
        }
    }
}

/// Formatter used to render messages
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FormatterKind {
    /// Single human-readable line (default)
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Console output stream
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleTarget {
    /// Standard output (default)
    #[default]
    Stdout,
    /// Standard error
    Stderr,
}

/// Console sink configuration
///
/// # Example
///
/// ```toml
/// [sinks.console]
/// type = "console"
/// level = "debug"
/// color = false
/// target = "stderr"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConsoleSinkConfig {
    /// Whether this sink is enabled
    /// Default: true
    pub enabled: bool,

    /// Severity threshold
    /// Default: debug
    pub level: Level,

    /// Formatter
    /// Default: text
    pub formatter: FormatterKind,

    /// Colorize by level when the stream is a terminal
    /// Default: true
    pub color: bool,

    /// Output stream
    /// Default: stdout
    pub target: ConsoleTarget,
}

impl Default for ConsoleSinkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: Level::Debug,
            formatter: FormatterKind::Text,
            color: true,
            target: ConsoleTarget::Stdout,
        }
    }
}

/// When the file sink starts a new file
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RotatePolicy {
    /// Rotate once the current file reaches `rotate_size` bytes
    Size,
    /// Rotate every `rotate_interval` (default)
    #[default]
    Duration,
}

/// How the file sink prunes old archives
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SweepPolicy {
    /// Keep the newest `sweep_count` archives (default)
    #[default]
    Count,
    /// Delete archives older than `sweep_interval`
    Age,
}

/// File sink configuration
///
/// # Example
///
/// ```toml
/// [sinks.file]
/// type = "file"
/// level = "info"
/// path = "logs"
/// pattern = "app-*"
/// rotate_policy = "size"
/// rotate_size = 52428800
/// sweep_policy = "age"
/// sweep_interval = "7d"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FileSinkConfig {
    /// Whether this sink is enabled
    /// Default: true
    pub enabled: bool,

    /// Severity threshold
    /// Default: debug
    pub level: Level,

    /// Formatter
    /// Default: text
    pub formatter: FormatterKind,

    /// Directory holding the active file and its archives
    /// Default: "logs"
    pub path: String,

    /// Filename pattern with at most one `*` (replaced by a random number)
    /// Default: none (`<binary>-<timestamp>.log`)
    pub pattern: Option<String>,

    /// Rotation policy (size, duration)
    /// Default: duration
    pub rotate_policy: RotatePolicy,

    /// Size threshold in bytes for size rotation
    /// Default: 52428800 (50 MiB)
    pub rotate_size: u64,

    /// Interval for duration rotation
    /// Default: 24h
    #[serde(with = "humantime_serde")]
    pub rotate_interval: Duration,

    /// Sweep policy (count, age)
    /// Default: count
    pub sweep_policy: SweepPolicy,

    /// Archives kept by count sweeping
    /// Default: 5
    pub sweep_count: usize,

    /// Maximum archive age for age sweeping
    /// Default: 7d
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,

    /// In-memory buffer size in bytes
    /// Default: 2048
    pub buffer_size: usize,

    /// Message queue capacity
    /// Default: 8
    pub queue_size: usize,

    /// Period of the rotation check
    /// Default: 1m
    #[serde(with = "humantime_serde")]
    pub check_interval: Duration,

    /// How long close waits for the background task
    /// Default: 1s
    #[serde(with = "humantime_serde")]
    pub close_grace: Duration,

    /// Also sweep archives of the default naming scheme when a pattern is set
    /// Default: false
    pub sweep_default_family: bool,
}

impl Default for FileSinkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: Level::Debug,
            formatter: FormatterKind::Text,
            path: "logs".into(),
            pattern: None,
            rotate_policy: RotatePolicy::Duration,
            rotate_size: DEFAULT_ROTATE_SIZE,
            rotate_interval: DEFAULT_ROTATE_INTERVAL,
            sweep_policy: SweepPolicy::Count,
            sweep_count: DEFAULT_SWEEP_COUNT,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            buffer_size: DEFAULT_BUFFER_SIZE,
            queue_size: DEFAULT_QUEUE_SIZE,
            check_interval: DEFAULT_CHECK_INTERVAL,
            close_grace: DEFAULT_CLOSE_GRACE,
            sweep_default_family: false,
        }
    }
}

/// Syslog sink configuration
///
/// # Example
///
/// ```toml
/// [sinks.syslog]
/// type = "syslog"
/// level = "warn"
/// address = "udp://127.0.0.1:514"
/// facility = "local0"
/// tag = "myapp"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyslogSinkConfig {
    /// Whether this sink is enabled
    /// Default: true
    pub enabled: bool,

    /// Severity threshold
    /// Default: debug
    pub level: Level,

    /// Formatter for the message part of the frame
    /// Default: text
    pub formatter: FormatterKind,

    /// `tcp://host:port`, `udp://host:port`, `host:port` (tcp) or
    /// `unix:///path`; empty means the local syslog socket
    /// Default: ""
    pub address: String,

    /// Facility name (kern, user, daemon, local0..local7, ...)
    /// Default: user
    pub facility: String,

    /// Tag written before the pid; empty means the binary name
    /// Default: ""
    pub tag: String,

    /// Message queue capacity
    /// Default: 8
    pub queue_size: usize,

    /// How long close waits for the background task
    /// Default: 1s
    #[serde(with = "humantime_serde")]
    pub close_grace: Duration,
}

impl Default for SyslogSinkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: Level::Debug,
            formatter: FormatterKind::Text,
            address: String::new(),
            facility: "user".into(),
            tag: String::new(),
            queue_size: DEFAULT_QUEUE_SIZE,
            close_grace: DEFAULT_CLOSE_GRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_defaults() {
        let config = FileSinkConfig::default();
        assert!(config.enabled);
        assert_eq!(config.rotate_policy, RotatePolicy::Duration);
        assert_eq!(config.rotate_size, 50 * 1024 * 1024);
        assert_eq!(config.rotate_interval, Duration::from_secs(86_400));
        assert_eq!(config.sweep_policy, SweepPolicy::Count);
        assert_eq!(config.sweep_count, 5);
        assert_eq!(config.sweep_interval, Duration::from_secs(7 * 86_400));
        assert_eq!(config.buffer_size, 2048);
        assert_eq!(config.queue_size, 8);
        assert!(!config.sweep_default_family);
    }

    #[test]
    fn test_deserialize_console() {
        let toml = r#"
[console]
type = "console"
level = "warn"
color = false
target = "stderr"
formatter = "json"
"#;
        let config: SinksConfig = toml::from_str(toml).unwrap();
        let sink = config.get("console").unwrap();
        assert_eq!(sink.type_name(), "console");
        assert_eq!(sink.level(), Level::Warn);
        assert_eq!(sink.formatter(), FormatterKind::Json);

        if let SinkConfig::Console(console) = sink {
            assert!(!console.color);
            assert_eq!(console.target, ConsoleTarget::Stderr);
        } else {
            panic!("Expected console config");
        }
    }

    #[test]
    fn test_deserialize_file_full() {
        let toml = r#"
[file]
type = "file"
level = "info"
path = "/var/log/app"
pattern = "app-*.log"
rotate_policy = "size"
rotate_size = 1024
rotate_interval = "1h"
sweep_policy = "age"
sweep_count = 3
sweep_interval = "2d"
buffer_size = 4096
queue_size = 16
check_interval = "30s"
close_grace = "500ms"
sweep_default_family = true
"#;
        let config: SinksConfig = toml::from_str(toml).unwrap();

        if let Some(SinkConfig::File(file)) = config.get("file") {
            assert_eq!(file.level, Level::Info);
            assert_eq!(file.path, "/var/log/app");
            assert_eq!(file.pattern.as_deref(), Some("app-*.log"));
            assert_eq!(file.rotate_policy, RotatePolicy::Size);
            assert_eq!(file.rotate_size, 1024);
            assert_eq!(file.rotate_interval, Duration::from_secs(3600));
            assert_eq!(file.sweep_policy, SweepPolicy::Age);
            assert_eq!(file.sweep_count, 3);
            assert_eq!(file.sweep_interval, Duration::from_secs(2 * 86_400));
            assert_eq!(file.buffer_size, 4096);
            assert_eq!(file.queue_size, 16);
            assert_eq!(file.check_interval, Duration::from_secs(30));
            assert_eq!(file.close_grace, Duration::from_millis(500));
            assert!(file.sweep_default_family);
        } else {
            panic!("Expected file config");
        }
    }

    #[test]
    fn test_deserialize_syslog() {
        let toml = r#"
[remote]
type = "syslog"
address = "udp://10.0.0.1:514"
facility = "local3"
tag = "api"
"#;
        let config: SinksConfig = toml::from_str(toml).unwrap();

        if let Some(SinkConfig::Syslog(syslog)) = config.get("remote") {
            assert_eq!(syslog.address, "udp://10.0.0.1:514");
            assert_eq!(syslog.facility, "local3");
            assert_eq!(syslog.tag, "api");
            assert_eq!(syslog.level, Level::Debug);
        } else {
            panic!("Expected syslog config");
        }
    }

    #[test]
    fn test_deserialize_multiple_sinks() {
        let toml = r#"
[console]
type = "console"

[file_a]
type = "file"
path = "a"

[file_b]
type = "file"
path = "b"
enabled = false
"#;
        let config: SinksConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.len(), 3);
        assert!(config.contains("file_a"));
        assert!(!config.get("file_b").unwrap().is_enabled());
    }

    #[test]
    fn test_deserialize_unknown_type() {
        let toml = r#"
[kafka]
type = "kafka"
"#;
        let result: Result<SinksConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_unknown_policy() {
        let toml = r#"
[file]
type = "file"
rotate_policy = "weekly"
"#;
        let result: Result<SinksConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }
}
