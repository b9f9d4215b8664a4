//! Console Sink - one line per message on stdout or stderr
//!
//! Writes synchronously; there is no queue and nothing to drain on close.
//! On a terminal each level gets its own color, applied from the level tag
//! to the end of the line.
//!
//! # Example Output
//!
//! ```text
//! 2025/01/15 10:30:45.123 [I] server started (port = 8080)
//! 2025/01/15 10:30:45.200 [W] cache miss ratio high
//! ```

use std::io::{self, IsTerminal, Write};
use std::sync::Arc;

use async_trait::async_trait;
use fanlog_protocol::{Formatter, Level, Message};
use owo_colors::{OwoColorize, Style};
use parking_lot::Mutex;

use crate::common::{SharedFormatter, Sink, SinkError, SinkMetrics};

/// Console output stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConsoleTarget {
    /// Standard output
    #[default]
    Stdout,
    /// Standard error
    Stderr,
}

/// Configuration for the console sink
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Severity threshold
    pub level: Level,

    /// Colorize by level (only when the stream is a terminal)
    pub color: bool,

    /// Output stream
    pub target: ConsoleTarget,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            level: Level::Debug,
            color: true,
            target: ConsoleTarget::Stdout,
        }
    }
}

impl ConsoleConfig {
    /// Create config with colors disabled (for piped output)
    pub fn no_color() -> Self {
        Self {
            color: false,
            ..Self::default()
        }
    }

    /// Set the severity threshold
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Write to stderr instead of stdout
    #[must_use]
    pub fn with_stderr(mut self) -> Self {
        self.target = ConsoleTarget::Stderr;
        self
    }
}

// =============================================================================
// Color Styles
// =============================================================================

/// Style for the tagged part of a line
fn level_style(level: Level) -> Style {
    match level {
        Level::Panic => Style::new(),
        Level::Fatal => Style::new().magenta(),
        Level::Error => Style::new().red(),
        Level::Warn => Style::new().yellow(),
        Level::Info => Style::new().cyan(),
        Level::Verbose => Style::new().white(),
        Level::Debug => Style::new().green(),
        Level::Trace => Style::new().blue(),
    }
}

/// Color `line` from the first occurrence of the level tag onwards
fn colorize(line: &str, level: Level) -> String {
    match line.find(level.tag()) {
        Some(at) => {
            let (plain, tagged) = line.split_at(at);
            format!("{plain}{}", tagged.style(level_style(level)))
        }
        None => line.to_string(),
    }
}

/// Console sink
pub struct ConsoleSink {
    name: String,
    level: Level,
    color: bool,
    writer: Mutex<Box<dyn Write + Send>>,
    formatter: SharedFormatter,
    metrics: Arc<SinkMetrics>,
}

impl ConsoleSink {
    /// Console sink named "console"
    pub fn new(config: ConsoleConfig) -> Self {
        Self::with_name("console", config)
    }

    /// Console sink with a custom name
    pub fn with_name(name: impl Into<String>, config: ConsoleConfig) -> Self {
        let (writer, is_terminal): (Box<dyn Write + Send>, bool) = match config.target {
            ConsoleTarget::Stdout => (Box::new(io::stdout()), io::stdout().is_terminal()),
            ConsoleTarget::Stderr => (Box::new(io::stderr()), io::stderr().is_terminal()),
        };
        Self::build(name.into(), config.level, config.color && is_terminal, writer)
    }

    /// Console sink writing to an arbitrary writer
    ///
    /// `config.color` is honoured as is, without a terminal check.
    pub fn with_writer(
        name: impl Into<String>,
        config: ConsoleConfig,
        writer: impl Write + Send + 'static,
    ) -> Self {
        Self::build(name.into(), config.level, config.color, Box::new(writer))
    }

    fn build(name: String, level: Level, color: bool, writer: Box<dyn Write + Send>) -> Self {
        Self {
            name,
            level,
            color,
            writer: Mutex::new(writer),
            formatter: SharedFormatter::default(),
            metrics: Arc::new(SinkMetrics::new()),
        }
    }

    /// Whether output is colorized
    pub fn is_colored(&self) -> bool {
        self.color
    }

    /// Get reference to metrics
    pub fn metrics(&self) -> &SinkMetrics {
        &self.metrics
    }

    fn render(&self, message: &Message) -> String {
        let line = self.formatter.format(message);
        if self.color {
            colorize(&line, message.level())
        } else {
            line
        }
    }
}

#[async_trait]
impl Sink for ConsoleSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn level(&self) -> Level {
        self.level
    }

    async fn write(&self, message: Arc<Message>) {
        self.metrics.message_received();
        let mut line = self.render(&message);
        line.push('\n');

        let mut writer = self.writer.lock();
        match writer.write_all(line.as_bytes()) {
            Ok(()) => self.metrics.written(1, line.len() as u64),
            Err(e) => {
                self.metrics.write_error();
                tracing::debug!(sink = %self.name, error = %e, "console write failed");
            }
        }
    }

    async fn close(&self) -> Result<(), SinkError> {
        self.writer.lock().flush()?;
        Ok(())
    }

    fn set_formatter(&self, formatter: Box<dyn Formatter>) -> bool {
        self.formatter.store(formatter);
        true
    }
}
