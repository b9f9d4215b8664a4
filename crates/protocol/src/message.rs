//! Log message record
//!
//! A `Message` is the minimal dispatch unit. It is built once by the caller,
//! wrapped in an `Arc`, and handed to every sink that accepts its level.
//! Nothing mutates it after construction.

use std::collections::BTreeMap;
use std::panic::Location;

use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::Value;

use crate::level::Level;

/// Structured key/value payload
///
/// Keys iterate in sorted order so formatted output is deterministic.
pub type Fields = BTreeMap<String, Value>;

/// Location of the logging call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallSite {
    /// Source file basename
    pub filename: String,

    /// Line number
    pub line: u32,

    /// Enclosing function or module path
    pub function: String,
}

impl CallSite {
    /// Create a call site, keeping only the basename of `file`
    pub fn new(file: &str, line: u32, function: impl Into<String>) -> Self {
        let filename = file.rsplit(['/', '\\']).next().unwrap_or(file).to_string();
        Self {
            filename,
            line,
            function: function.into(),
        }
    }

    /// Capture the location of the caller
    ///
    /// `function` is usually `module_path!()` since Rust has no runtime
    /// function names.
    #[track_caller]
    pub fn caller(function: impl Into<String>) -> Self {
        let location = Location::caller();
        Self::new(location.file(), location.line(), function)
    }
}

/// Immutable log record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    level: Level,

    #[serde(rename = "message")]
    text: String,

    timestamp: DateTime<Local>,

    #[serde(flatten)]
    caller: Option<CallSite>,

    #[serde(skip)]
    fields: Fields,
}

impl Message {
    /// Create a message stamped with the current local time
    pub fn new(level: Level, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
            timestamp: Local::now(),
            caller: None,
            fields: Fields::new(),
        }
    }

    /// Attach structured fields
    #[must_use]
    pub fn with_fields(mut self, fields: Fields) -> Self {
        self.fields = fields;
        self
    }

    /// Attach a single field
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Attach call-site information
    #[must_use]
    pub fn with_caller(mut self, caller: CallSite) -> Self {
        self.caller = Some(caller);
        self
    }

    /// Override the timestamp
    #[must_use]
    pub fn at(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Severity
    #[inline]
    pub fn level(&self) -> Level {
        self.level
    }

    /// Message text
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Creation time
    #[inline]
    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    /// Call-site information, if captured
    #[inline]
    pub fn caller(&self) -> Option<&CallSite> {
        self.caller.as_ref()
    }

    /// Structured fields (empty when none were attached)
    #[inline]
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Whether the message carries no text
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
