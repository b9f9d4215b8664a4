//! Logger facade
//!
//! A cheap, cloneable handle over a shared `Registry`. Each call builds one
//! `Message` and dispatches it. `fatal` and `panic` end the process after
//! the message has been delivered and every sink closed.

use std::backtrace::Backtrace;
use std::sync::Arc;

use fanlog_protocol::{CallSite, Fields, Level, Message};
use serde_json::Value;

use crate::registry::Registry;

/// Function name recorded by `Logger::trace`; the `trace!` macro records
/// the caller's module path instead.
const UNKNOWN_FUNCTION: &str = "?";

/// Logging handle
#[derive(Clone)]
pub struct Logger {
    registry: Arc<Registry>,
    fields: Fields,
}

impl Logger {
    /// Logger dispatching through `registry`
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            fields: Fields::new(),
        }
    }

    /// The registry behind this logger
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Fields attached to every message of this logger
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Logger that attaches `fields` to every message
    ///
    /// Keys already present are overwritten.
    #[must_use]
    pub fn with_fields(&self, fields: Fields) -> Self {
        let mut merged = self.fields.clone();
        merged.extend(fields);
        Self {
            registry: Arc::clone(&self.registry),
            fields: merged,
        }
    }

    /// Logger that attaches one more field to every message
    #[must_use]
    pub fn with_field(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut fields = self.fields.clone();
        fields.insert(key.into(), value.into());
        Self {
            registry: Arc::clone(&self.registry),
            fields,
        }
    }

    /// Dispatch a message at `level`; returns the number of receiving sinks
    pub async fn log(&self, level: Level, text: impl Into<String>) -> usize {
        self.dispatch(level, text.into(), None).await
    }

    /// Trace message carrying the caller's file and line
    #[track_caller]
    pub fn trace(&self, text: impl Into<String>) -> impl Future<Output = usize> + Send + '_ {
        let caller = CallSite::caller(UNKNOWN_FUNCTION);
        let text: String = text.into();
        self.trace_at(caller, text)
    }

    /// Trace message with an explicit call site
    pub async fn trace_at(&self, caller: CallSite, text: impl Into<String>) -> usize {
        self.dispatch(Level::Trace, text.into(), Some(caller)).await
    }

    pub async fn debug(&self, text: impl Into<String>) -> usize {
        self.log(Level::Debug, text).await
    }

    pub async fn verbose(&self, text: impl Into<String>) -> usize {
        self.log(Level::Verbose, text).await
    }

    pub async fn info(&self, text: impl Into<String>) -> usize {
        self.log(Level::Info, text).await
    }

    pub async fn warn(&self, text: impl Into<String>) -> usize {
        self.log(Level::Warn, text).await
    }

    pub async fn error(&self, text: impl Into<String>) -> usize {
        self.log(Level::Error, text).await
    }

    /// Dispatch a fatal message, close every sink and exit with status 1
    pub async fn fatal(&self, text: impl Into<String>) {
        self.terminate(Level::Fatal, text.into()).await;
        std::process::exit(1);
    }

    /// Dispatch a panic message, print a backtrace, close every sink and
    /// exit with status 1
    pub async fn panic(&self, text: impl Into<String>) {
        self.terminate(Level::Panic, text.into()).await;
        std::process::exit(1);
    }

    /// Everything `fatal`/`panic` do short of exiting
    pub(crate) async fn terminate(&self, level: Level, text: String) {
        self.dispatch(level, text, None).await;

        if level == Level::Panic {
            eprintln!("{}", Backtrace::force_capture());
        }

        if let Err(e) = self.registry.close().await {
            eprintln!("fanlog: {e}");
        }
    }

    async fn dispatch(&self, level: Level, text: String, caller: Option<CallSite>) -> usize {
        let mut message = Message::new(level, text);
        if !self.fields.is_empty() {
            message = message.with_fields(self.fields.clone());
        }
        if let Some(caller) = caller {
            message = message.with_caller(caller);
        }
        self.registry.dispatch(message).await
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("registry", &self.registry)
            .field("fields", &self.fields)
            .finish()
    }
}
