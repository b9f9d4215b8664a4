//! Message formatters
//!
//! A formatter produces the exact line a sink appends (without the trailing
//! newline). Sinks never inspect the output.
//!
//! # Text output
//!
//! ```text
//! 2025/01/15 10:30:45.123 [I] request completed (status = 200, user = alice)
//! 2025/01/15 10:30:45.124 [T] [main.rs:42 - app::server] entering handler
//! ```
//!
//! # JSON output
//!
//! ```text
//! {"level":"Info","message":"request completed","status":200,"timestamp":"2025-01-15T10:30:45.123+00:00","user":"alice"}
//! ```

use std::fmt::Write as FmtWrite;

use serde_json::{Map, Value};

use crate::message::Message;

/// Timestamp layout used by `TextFormatter`
pub const TEXT_TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S%.3f";

/// Turns a message into a single output line
pub trait Formatter: Send + Sync {
    /// Format `message` without a trailing newline
    fn format(&self, message: &Message) -> String;
}

impl<F: Formatter + ?Sized> Formatter for Box<F> {
    fn format(&self, message: &Message) -> String {
        (**self).format(message)
    }
}

/// Human-readable single-line formatter (the default for every sink)
#[derive(Debug, Clone, Copy, Default)]
pub struct TextFormatter;

impl TextFormatter {
    /// Create a text formatter
    pub const fn new() -> Self {
        Self
    }
}

impl Formatter for TextFormatter {
    fn format(&self, message: &Message) -> String {
        let mut buf = String::with_capacity(64 + message.text().len());

        let _ = write!(buf, "{}", message.timestamp().format(TEXT_TIMESTAMP_FORMAT));
        buf.push(' ');
        buf.push_str(message.level().tag());

        if let Some(caller) = message.caller() {
            let _ = write!(
                buf,
                " [{}:{} - {}]",
                caller.filename, caller.line, caller.function
            );
        }

        buf.push(' ');
        buf.push_str(message.text());

        if !message.fields().is_empty() {
            buf.push_str(" (");
            for (i, (key, value)) in message.fields().iter().enumerate() {
                if i > 0 {
                    buf.push_str(", ");
                }
                buf.push_str(key);
                buf.push_str(" = ");
                push_value(&mut buf, value);
            }
            buf.push(')');
        }

        buf
    }
}

/// Strings print bare, everything else prints as JSON
fn push_value(buf: &mut String, value: &Value) {
    match value {
        Value::String(s) => buf.push_str(s),
        other => {
            let _ = write!(buf, "{}", other);
        }
    }
}

/// One JSON object per line
///
/// With fields, the fields and the standard keys share one flat object.
/// Standard keys win on collision.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    /// Create a JSON formatter
    pub const fn new() -> Self {
        Self
    }

    fn format_flat(message: &Message) -> serde_json::Result<String> {
        let mut object: Map<String, Value> = message
            .fields()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        object.insert("level".into(), serde_json::to_value(message.level())?);
        object.insert("message".into(), Value::String(message.text().to_string()));
        object.insert("timestamp".into(), serde_json::to_value(message.timestamp())?);

        if let Some(caller) = message.caller() {
            object.insert("filename".into(), Value::String(caller.filename.clone()));
            object.insert("line".into(), Value::from(caller.line));
            object.insert("function".into(), Value::String(caller.function.clone()));
        }

        serde_json::to_string(&object)
    }
}

impl Formatter for JsonFormatter {
    fn format(&self, message: &Message) -> String {
        let result = if message.fields().is_empty() {
            serde_json::to_string(message)
        } else {
            Self::format_flat(message)
        };

        match result {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize log message");
                String::new()
            }
        }
    }
}
