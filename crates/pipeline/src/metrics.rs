//! Registry dispatch metrics
//!
//! Atomic counters for tracking dispatch decisions.
//! All operations use relaxed ordering; values are eventually consistent.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for the sink registry
#[derive(Debug, Default)]
pub struct RegistryMetrics {
    /// Messages handed to `dispatch`
    messages_received: AtomicU64,

    /// Messages delivered to at least one sink
    messages_dispatched: AtomicU64,

    /// Messages dropped for having empty text
    messages_empty: AtomicU64,

    /// Messages no sink accepted (threshold or release mode)
    messages_filtered: AtomicU64,

    /// Individual sink deliveries
    deliveries: AtomicU64,
}

impl RegistryMetrics {
    /// Create new metrics instance with all counters at zero
    #[inline]
    pub const fn new() -> Self {
        Self {
            messages_received: AtomicU64::new(0),
            messages_dispatched: AtomicU64::new(0),
            messages_empty: AtomicU64::new(0),
            messages_filtered: AtomicU64::new(0),
            deliveries: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn record_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_empty(&self) {
        self.messages_empty.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_filtered(&self) {
        self.messages_filtered.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_dispatched(&self, deliveries: u64) {
        self.messages_dispatched.fetch_add(1, Ordering::Relaxed);
        self.deliveries.fetch_add(deliveries, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_dispatched: self.messages_dispatched.load(Ordering::Relaxed),
            messages_empty: self.messages_empty.load(Ordering::Relaxed),
            messages_filtered: self.messages_filtered.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of registry metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub messages_received: u64,
    pub messages_dispatched: u64,
    pub messages_empty: u64,
    pub messages_filtered: u64,
    pub deliveries: u64,
}
