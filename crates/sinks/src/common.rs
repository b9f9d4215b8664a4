//! Common types shared by all sinks
//!
//! The `Sink` trait, errors, counters, the hot-swappable formatter and the
//! close-once lifecycle of sinks that own a background task.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use fanlog_protocol::{Formatter, Level, Message, TextFormatter};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::util::NamingError;

/// A destination for log messages
///
/// `write` never reports failures to the caller: background errors are
/// counted and surfaced through `tracing`. After `close` returns, writes are
/// dropped.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Name the sink is registered under
    fn name(&self) -> &str;

    /// Least severe level the sink accepts
    fn level(&self) -> Level;

    /// Deliver one message
    async fn write(&self, message: Arc<Message>);

    /// Flush and release resources; later calls are no-ops
    async fn close(&self) -> Result<(), SinkError>;

    /// Replace the formatter, returning false if the sink does not support it
    fn set_formatter(&self, _formatter: Box<dyn Formatter>) -> bool {
        false
    }
}

/// Common sink errors
#[derive(Debug, Error)]
pub enum SinkError {
    /// Sink initialization failed
    #[error("failed to initialize sink: {0}")]
    Init(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid filename pattern
    #[error(transparent)]
    Naming(#[from] NamingError),

    /// Connection error (for network sinks)
    #[error("connection error: {0}")]
    Connection(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Background task ended abnormally
    #[error("sink task failed: {0}")]
    Task(String),
}

impl SinkError {
    /// Create an initialization error
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Init(msg.into())
    }

    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Counters shared by all sink types
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Messages accepted by `write`
    pub messages_received: AtomicU64,

    /// Messages dropped (sink closed or queue gone)
    pub messages_dropped: AtomicU64,

    /// Lines handed to the destination
    pub lines_written: AtomicU64,

    /// Bytes handed to the destination
    pub bytes_written: AtomicU64,

    /// Write errors encountered
    pub write_errors: AtomicU64,
}

impl SinkMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            messages_received: AtomicU64::new(0),
            messages_dropped: AtomicU64::new(0),
            lines_written: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
        }
    }

    /// Record a received message
    #[inline]
    pub fn message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a dropped message
    #[inline]
    pub fn message_dropped(&self) {
        self.messages_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record written output
    #[inline]
    pub fn written(&self, lines: u64, bytes: u64) {
        self.lines_written.fetch_add(lines, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record a write error
    #[inline]
    pub fn write_error(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_dropped: self.messages_dropped.load(Ordering::Relaxed),
            lines_written: self.lines_written.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of sink metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub messages_received: u64,
    pub messages_dropped: u64,
    pub lines_written: u64,
    pub bytes_written: u64,
    pub write_errors: u64,
}

// =============================================================================
// Formatter slot
// =============================================================================

/// Formatter that can be replaced while the sink is running
pub struct SharedFormatter {
    inner: ArcSwap<Box<dyn Formatter>>,
}

impl SharedFormatter {
    /// Slot holding `formatter`
    pub fn new(formatter: Box<dyn Formatter>) -> Self {
        Self {
            inner: ArcSwap::from_pointee(formatter),
        }
    }

    /// Format with the current formatter
    pub fn format(&self, message: &Message) -> String {
        self.inner.load().format(message)
    }

    /// Install a new formatter for subsequent messages
    pub fn store(&self, formatter: Box<dyn Formatter>) {
        self.inner.store(Arc::new(formatter));
    }
}

impl Default for SharedFormatter {
    fn default() -> Self {
        Self::new(Box::new(TextFormatter::new()))
    }
}

impl std::fmt::Debug for SharedFormatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedFormatter").finish_non_exhaustive()
    }
}

// =============================================================================
// Background task lifecycle
// =============================================================================

/// Close-once control of a sink's background task
#[derive(Debug)]
pub(crate) struct TaskLifecycle {
    closed: AtomicBool,
    shutdown: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
    grace: Duration,
}

impl TaskLifecycle {
    pub(crate) fn new(shutdown: CancellationToken, task: JoinHandle<()>, grace: Duration) -> Self {
        Self {
            closed: AtomicBool::new(false),
            shutdown,
            task: Mutex::new(Some(task)),
            grace,
        }
    }

    #[inline]
    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Signal shutdown and wait up to the grace period for the task
    ///
    /// Only the first caller does any work. A task still running when the
    /// grace period ends is aborted, losing whatever it had not written yet.
    /// Workers stop waiting on background work once shutdown is signalled.
    pub(crate) async fn close(&self, sink: &str) -> Result<(), SinkError> {
        if self
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }

        self.shutdown.cancel();

        let Some(mut task) = self.task.lock().take() else {
            return Ok(());
        };

        match tokio::time::timeout(self.grace, &mut task).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) if e.is_cancelled() => Ok(()),
            Ok(Err(e)) => Err(SinkError::Task(e.to_string())),
            Err(_) => {
                tracing::warn!(sink = %sink, grace = ?self.grace, "sink did not drain in time, aborting");
                task.abort();
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[path = "common_test.rs"]
mod common_test;
