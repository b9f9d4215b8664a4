//! Rate-limited diagnostics for sink background tasks
//!
//! A full disk or an unreachable syslog daemon fails every write. This keeps
//! fanlog's own `tracing` output to one event per interval per sink, carrying
//! the number of failures that were folded into it.

use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Default interval between reported failures
pub const DEFAULT_LOG_INTERVAL: Duration = Duration::from_secs(10);

/// Reports sink failures at most once per interval
#[derive(Debug)]
pub struct RateLimitedLogger {
    sink: String,
    min_interval: Duration,
    last_log_time: Mutex<Option<Instant>>,
    /// Failures since the last report
    pending: AtomicU64,
    total: AtomicU64,
}

impl RateLimitedLogger {
    /// Logger for the sink called `sink`
    pub fn new(sink: impl Into<String>, min_interval: Duration) -> Self {
        Self {
            sink: sink.into(),
            min_interval,
            last_log_time: Mutex::new(None),
            pending: AtomicU64::new(0),
            total: AtomicU64::new(0),
        }
    }

    /// Logger with the default interval
    pub fn for_sink(sink: impl Into<String>) -> Self {
        Self::new(sink, DEFAULT_LOG_INTERVAL)
    }

    /// Record a failure, logging it unless one was logged recently
    ///
    /// Returns whether the failure was logged.
    pub fn error(&self, context: &str, error: &dyn Display) -> bool {
        self.pending.fetch_add(1, Ordering::Relaxed);
        let total = self.total.fetch_add(1, Ordering::Relaxed) + 1;

        if !self.should_log() {
            return false;
        }

        let folded = self.pending.swap(0, Ordering::Relaxed).saturating_sub(1);
        if folded > 0 {
            tracing::error!(
                sink = %self.sink,
                error = %error,
                suppressed = folded,
                total_errors = total,
                "{context} (rate-limited)"
            );
        } else {
            tracing::error!(sink = %self.sink, error = %error, total_errors = total, "{context}");
        }
        true
    }

    fn should_log(&self) -> bool {
        let mut last = self.last_log_time.lock();
        let now = Instant::now();
        match *last {
            Some(at) if now.duration_since(at) < self.min_interval => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }

    /// Failures recorded since the last report
    pub fn pending_error_count(&self) -> u64 {
        self.pending.load(Ordering::Relaxed)
    }

    /// Failures recorded since creation
    pub fn total_error_count(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}
