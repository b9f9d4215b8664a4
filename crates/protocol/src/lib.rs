//! fanlog Protocol - Core record types shared by every sink
//!
//! This crate provides the values that flow from callers to sinks:
//! - `Level` - Severity taxonomy (Panic through Trace) with names and tags
//! - `Message` - Immutable log record, shared as `Arc<Message>` across sinks
//! - `Fields` - Structured key/value payload attached to a message
//! - `CallSite` - Optional file/line/function of the logging call
//! - `Formatter` - Turns a message into the exact line a sink writes
//!
//! # Design Principles
//!
//! - **Immutable records**: a message is built once and read by every sink
//! - **Arc-friendly**: one allocation per log call regardless of sink count
//! - **Opaque formatting**: sinks treat formatter output as bytes to append

mod error;
mod formatter;
mod level;
mod message;

pub use error::ProtocolError;
pub use formatter::{Formatter, JsonFormatter, TextFormatter, TEXT_TIMESTAMP_FORMAT};
pub use level::Level;
pub use message::{CallSite, Fields, Message};

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

#[cfg(test)]
mod formatter_test;
