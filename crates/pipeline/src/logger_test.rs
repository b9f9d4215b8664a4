//! Logger facade and macro tests

use std::sync::Arc;

use fanlog_config::Mode;
use fanlog_protocol::{Fields, Level};
use serde_json::json;

use crate::logger::Logger;
use crate::registry::Registry;
use crate::test_support::CaptureSink;

async fn setup(mode: Mode) -> (Logger, Arc<CaptureSink>) {
    let registry = Arc::new(Registry::with_mode(mode));
    let sink = CaptureSink::new("capture", Level::Trace);
    registry.register(sink.clone()).await.unwrap();
    (Logger::new(registry), sink)
}

#[tokio::test]
async fn test_level_methods() {
    let (logger, sink) = setup(Mode::Debug).await;

    logger.debug("d").await;
    logger.verbose("v").await;
    logger.info("i").await;
    logger.warn("w").await;
    logger.error("e").await;

    let levels: Vec<Level> = sink.messages().iter().map(|m| m.level()).collect();
    assert_eq!(
        levels,
        vec![Level::Debug, Level::Verbose, Level::Info, Level::Warn, Level::Error]
    );
    assert!(sink.messages().iter().all(|m| m.caller().is_none()));
}

#[tokio::test]
async fn test_trace_records_call_site() {
    let (logger, sink) = setup(Mode::Debug).await;

    let line = line!() + 1;
    logger.trace("entering").await;

    let messages = sink.messages();
    let caller = messages[0].caller().unwrap();
    assert_eq!(caller.filename, "logger_test.rs");
    assert_eq!(caller.line, line);
}

#[tokio::test]
async fn test_trace_macro_records_module_path() {
    let (logger, sink) = setup(Mode::Debug).await;

    let line = line!() + 1;
    crate::trace!(logger, "step {}", 3).await;

    let messages = sink.messages();
    assert_eq!(messages[0].text(), "step 3");
    let caller = messages[0].caller().unwrap();
    assert_eq!(caller.line, line);
    assert_eq!(caller.function, module_path!());
}

#[tokio::test]
async fn test_format_macros() {
    let (logger, sink) = setup(Mode::Debug).await;
    let port = 8080;

    crate::debug!(logger, "a{}", 1).await;
    crate::verbose!(logger, "b{}", 2).await;
    crate::info!(logger, "listening on {port}").await;
    crate::warn!(logger, "{:>3}", "x").await;
    crate::error!(logger, "{}-{}", "e", 5).await;

    assert_eq!(sink.texts(), vec!["a1", "b2", "listening on 8080", "  x", "e-5"]);
}

#[tokio::test]
async fn test_release_mode_through_logger() {
    let (logger, sink) = setup(Mode::Release).await;

    assert_eq!(logger.trace("hidden").await, 0);
    assert_eq!(logger.debug("hidden").await, 0);
    assert_eq!(logger.info("shown").await, 1);

    assert_eq!(sink.texts(), vec!["shown"]);
}

#[tokio::test]
async fn test_with_fields() {
    let (logger, sink) = setup(Mode::Debug).await;

    let mut fields = Fields::new();
    fields.insert("user".into(), json!("alice"));
    fields.insert("attempt".into(), json!(1));

    let scoped = logger.with_fields(fields).with_field("attempt", 2);
    scoped.info("login").await;
    logger.info("plain").await;

    let messages = sink.messages();
    assert_eq!(messages[0].fields()["user"], json!("alice"));
    assert_eq!(messages[0].fields()["attempt"], json!(2));
    assert!(messages[1].fields().is_empty());
    assert!(logger.fields().is_empty());
}

#[tokio::test]
async fn test_log_empty_text_dropped() {
    let (logger, sink) = setup(Mode::Debug).await;
    assert_eq!(logger.log(Level::Error, "").await, 0);
    assert!(sink.messages().is_empty());
}

#[tokio::test]
async fn test_terminate_delivers_then_closes() {
    let (logger, sink) = setup(Mode::Release).await;

    logger.terminate(Level::Fatal, "giving up".into()).await;

    assert_eq!(sink.texts(), vec!["giving up"]);
    assert_eq!(sink.messages()[0].level(), Level::Fatal);
    assert_eq!(sink.closes(), 1);
    assert!(logger.registry().is_empty());
}
