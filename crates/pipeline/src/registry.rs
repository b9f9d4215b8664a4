//! Registry - named sinks and message fan-out
//!
//! The `Registry` owns every sink of an application and hands each message
//! to the sinks whose threshold accepts it. One `Arc<Message>` is shared by
//! all receiving sinks.
//!
//! # Dispatch Rules
//!
//! - Messages with empty text are dropped
//! - A sink receives a message when `message.level <= sink.level()`
//! - In release mode `Debug` and `Trace` messages are never dispatched

use std::collections::BTreeMap;
use std::sync::Arc;

use fanlog_config::Mode;
use fanlog_protocol::{Formatter, Level, Message};
use fanlog_sinks::Sink;
use parking_lot::RwLock;

use crate::error::{PipelineError, Result};
use crate::metrics::RegistryMetrics;

/// Named sinks plus the dispatch mode
///
/// # Example
///
/// ```ignore
/// let registry = Registry::new();
/// registry.register(Arc::new(ConsoleSink::new(ConsoleConfig::default()))).await?;
/// registry.dispatch(Message::new(Level::Info, "ready")).await;
/// registry.close().await?;
/// ```
pub struct Registry {
    sinks: RwLock<BTreeMap<String, Arc<dyn Sink>>>,
    mode: RwLock<Mode>,
    metrics: RegistryMetrics,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Empty registry in release mode
    pub fn new() -> Self {
        Self::with_mode(Mode::Release)
    }

    /// Empty registry in `mode`
    pub fn with_mode(mode: Mode) -> Self {
        Self {
            sinks: RwLock::new(BTreeMap::new()),
            mode: RwLock::new(mode),
            metrics: RegistryMetrics::new(),
        }
    }

    /// Current dispatch mode
    pub fn mode(&self) -> Mode {
        *self.mode.read()
    }

    /// Switch mode by name (`debug`, `dev`, `devel`, `release`)
    ///
    /// An unknown name leaves the mode unchanged.
    pub fn set_mode(&self, mode: &str) -> Result<()> {
        let mode: Mode = mode.parse()?;
        *self.mode.write() = mode;
        tracing::debug!(mode = %mode, "dispatch mode changed");
        Ok(())
    }

    /// Register `sink` under its name
    ///
    /// A sink already registered under the same name is replaced and closed.
    pub async fn register(&self, sink: Arc<dyn Sink>) -> Result<()> {
        let name = sink.name().to_string();
        let previous = self.sinks.write().insert(name.clone(), sink);

        tracing::debug!(sink = %name, replaced = previous.is_some(), "registered sink");

        match previous {
            Some(previous) => previous
                .close()
                .await
                .map_err(|e| PipelineError::sink(name, e)),
            None => Ok(()),
        }
    }

    /// Remove and close the sink called `name`
    ///
    /// Returns `false` if no such sink was registered.
    pub async fn unregister(&self, name: &str) -> Result<bool> {
        let removed = self.sinks.write().remove(name);
        match removed {
            Some(sink) => {
                sink.close().await.map_err(|e| PipelineError::sink(name, e))?;
                tracing::debug!(sink = %name, "unregistered sink");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Sink called `name`
    pub fn get(&self, name: &str) -> Option<Arc<dyn Sink>> {
        self.sinks.read().get(name).cloned()
    }

    /// Registered sink names, sorted
    pub fn names(&self) -> Vec<String> {
        self.sinks.read().keys().cloned().collect()
    }

    /// Number of registered sinks
    pub fn len(&self) -> usize {
        self.sinks.read().len()
    }

    /// Whether no sink is registered
    pub fn is_empty(&self) -> bool {
        self.sinks.read().is_empty()
    }

    /// Replace the formatter of the sink called `name`
    pub fn set_formatter(&self, name: &str, formatter: Box<dyn Formatter>) -> Result<()> {
        let sink = self
            .get(name)
            .ok_or_else(|| PipelineError::SinkNotRegistered(name.to_string()))?;

        if sink.set_formatter(formatter) {
            Ok(())
        } else {
            Err(PipelineError::FormatterUnsupported(name.to_string()))
        }
    }

    /// Whether a message at `level` would reach at least one sink
    pub fn is_enabled(&self, level: Level) -> bool {
        if self.mode().is_release() && level.is_development() {
            return false;
        }
        self.sinks.read().values().any(|sink| sink.level().accepts(level))
    }

    /// Hand `message` to every sink that accepts it
    ///
    /// Returns the number of sinks that received the message. Sink writes
    /// never fail; a full queue makes this wait.
    pub async fn dispatch(&self, message: Message) -> usize {
        self.metrics.record_received();

        if message.is_empty() {
            self.metrics.record_empty();
            return 0;
        }

        let level = message.level();
        if self.mode().is_release() && level.is_development() {
            self.metrics.record_filtered();
            return 0;
        }

        // Snapshot the targets so no lock is held across sink writes
        let targets: Vec<Arc<dyn Sink>> = self
            .sinks
            .read()
            .values()
            .filter(|sink| sink.level().accepts(level))
            .cloned()
            .collect();

        if targets.is_empty() {
            self.metrics.record_filtered();
            return 0;
        }

        let message = Arc::new(message);
        for sink in &targets {
            sink.write(Arc::clone(&message)).await;
        }

        self.metrics.record_dispatched(targets.len() as u64);
        targets.len()
    }

    /// Close and remove every sink
    ///
    /// All sinks are closed even if some fail; the failures are collected.
    pub async fn close(&self) -> Result<()> {
        let sinks = std::mem::take(&mut *self.sinks.write());

        let mut failures = Vec::new();
        for (name, sink) in sinks {
            if let Err(e) = sink.close().await {
                tracing::warn!(sink = %name, error = %e, "sink failed to close");
                failures.push((name, e));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::Close(failures))
        }
    }

    /// Get reference to metrics
    pub fn metrics(&self) -> &RegistryMetrics {
        &self.metrics
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("sinks", &self.names())
            .field("mode", &self.mode())
            .finish()
    }
}
