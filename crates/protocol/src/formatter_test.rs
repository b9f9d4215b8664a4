//! Tests for text and JSON formatters

use chrono::{Local, TimeZone};
use serde_json::{json, Value};

use crate::formatter::{Formatter, JsonFormatter, TextFormatter};
use crate::level::Level;
use crate::message::{CallSite, Message};

fn fixed_message(level: Level, text: &str) -> Message {
    let ts = Local.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
    Message::new(level, text).at(ts)
}

// =============================================================================
// TextFormatter
// =============================================================================

#[test]
fn test_text_basic_line() {
    let line = TextFormatter.format(&fixed_message(Level::Info, "server started"));
    assert_eq!(line, "2024/05/06 07:08:09.000 [I] server started");
}

#[test]
fn test_text_with_caller() {
    let msg = fixed_message(Level::Trace, "enter")
        .with_caller(CallSite::new("src/handler.rs", 12, "app::handler"));
    let line = TextFormatter.format(&msg);
    assert_eq!(
        line,
        "2024/05/06 07:08:09.000 [T] [handler.rs:12 - app::handler] enter"
    );
}

#[test]
fn test_text_with_fields_sorted_and_strings_bare() {
    let msg = fixed_message(Level::Debug, "Test Fields")
        .with_field("name", "derek")
        .with_field("age", 35);
    let line = TextFormatter.format(&msg);
    assert!(line.ends_with("[D] Test Fields (age = 35, name = derek)"), "{line}");
}

#[test]
fn test_text_has_no_trailing_newline() {
    let line = TextFormatter.format(&fixed_message(Level::Warn, "w"));
    assert!(!line.ends_with('\n'));
}

// =============================================================================
// JsonFormatter
// =============================================================================

#[test]
fn test_json_without_fields() {
    let line = JsonFormatter.format(&fixed_message(Level::Error, "failed"));
    let value: Value = serde_json::from_str(&line).unwrap();
    assert_eq!(value["level"], json!("Error"));
    assert_eq!(value["message"], json!("failed"));
    assert!(value["timestamp"].as_str().unwrap().starts_with("2024-05-06T07:08:09"));
    assert!(value.get("filename").is_none());
}

#[test]
fn test_json_with_fields_is_flat() {
    let msg = fixed_message(Level::Info, "login")
        .with_field("user", "alice")
        .with_field("attempt", 2);
    let value: Value = serde_json::from_str(&JsonFormatter.format(&msg)).unwrap();

    assert_eq!(value["user"], json!("alice"));
    assert_eq!(value["attempt"], json!(2));
    assert_eq!(value["level"], json!("Info"));
    assert_eq!(value["message"], json!("login"));
}

#[test]
fn test_json_standard_keys_win_over_fields() {
    let msg = fixed_message(Level::Warn, "real").with_field("message", "shadow");
    let value: Value = serde_json::from_str(&JsonFormatter.format(&msg)).unwrap();
    assert_eq!(value["message"], json!("real"));
}

#[test]
fn test_json_with_fields_and_caller() {
    let msg = fixed_message(Level::Trace, "t")
        .with_field("k", true)
        .with_caller(CallSite::new("lib.rs", 9, "crate::f"));
    let value: Value = serde_json::from_str(&JsonFormatter.format(&msg)).unwrap();
    assert_eq!(value["filename"], json!("lib.rs"));
    assert_eq!(value["line"], json!(9));
    assert_eq!(value["function"], json!("crate::f"));
    assert_eq!(value["k"], json!(true));
}

#[test]
fn test_boxed_formatter_delegates() {
    let boxed: Box<dyn Formatter> = Box::new(TextFormatter);
    let msg = fixed_message(Level::Info, "boxed");
    assert_eq!(boxed.format(&msg), TextFormatter.format(&msg));
}
