//! fanlog - Sinks
//!
//! Output destinations for log messages. Every sink implements the async
//! `Sink` trait and receives the same `Arc<Message>` from the registry.
//!
//! # Architecture
//!
//! Queued sinks own a bounded channel and a background task; the console
//! sink writes inline.
//!
//! ```text
//! [Registry] --Arc<Message>--> [Sink Channel] --> [Sink Task] --> [Destination]
//! ```
//!
//! # Available Sinks
//!
//! | Sink | Purpose | Queued |
//! |------|---------|--------|
//! | `console` | Colored lines on stdout/stderr | No |
//! | `file` | Buffered files with rotation, archiving and sweeping | Yes |
//! | `syslog` | BSD syslog frames over udp, tcp or the local socket | Yes |
//!
//! # Example
//!
//! ```ignore
//! use fanlog_sinks::{FileConfig, FileSink, Sink};
//!
//! let sink = FileSink::open(FileConfig::new("logs").with_pattern("api-*"))?;
//! sink.write(Arc::new(Message::new(Level::Info, "hello"))).await;
//! sink.close().await?;
//! ```

// =============================================================================
// Sink implementations (each in its own submodule)
// =============================================================================

/// Console sink - colored terminal output
pub mod console;

/// File sink - buffered writes, rotation, tar.gz archives, retention
pub mod file;

/// Syslog sink - local or remote syslog daemon
pub mod syslog;

// =============================================================================
// Shared utilities
// =============================================================================

/// Naming, archiving and sweeping for the file sink
pub mod util;

/// Sink trait, errors and metrics
mod common;

// =============================================================================
// Public re-exports
// =============================================================================

pub use common::{MetricsSnapshot, SharedFormatter, Sink, SinkError, SinkMetrics};

pub use console::{ConsoleConfig, ConsoleSink, ConsoleTarget};
pub use file::{FileConfig, FileMetricsSnapshot, FileSink, FileSinkMetrics, RotatePolicy};
pub use syslog::{Facility, SyslogAddress, SyslogConfig, SyslogFormatter, SyslogSink};
pub use util::{NamingError, NamingPolicy, SweepPolicy};
