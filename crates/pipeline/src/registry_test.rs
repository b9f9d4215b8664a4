//! Registry tests

use std::sync::Arc;

use fanlog_config::Mode;
use fanlog_protocol::{Level, Message, TextFormatter};

use crate::error::PipelineError;
use crate::registry::Registry;
use crate::test_support::{CaptureSink, FailingSink};

fn msg(level: Level, text: &str) -> Message {
    Message::new(level, text)
}

// ============================================================================
// Registration Tests
// ============================================================================

#[tokio::test]
async fn test_register_and_lookup() {
    let registry = Registry::new();
    assert!(registry.is_empty());

    registry.register(CaptureSink::new("b", Level::Info)).await.unwrap();
    registry.register(CaptureSink::new("a", Level::Info)).await.unwrap();

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.names(), vec!["a".to_string(), "b".to_string()]);
    assert_eq!(registry.get("a").unwrap().name(), "a");
    assert!(registry.get("missing").is_none());
}

#[tokio::test]
async fn test_register_replaces_and_closes_previous() {
    let registry = Registry::new();
    let first = CaptureSink::new("file", Level::Info);
    let second = CaptureSink::new("file", Level::Info);

    registry.register(first.clone()).await.unwrap();
    registry.register(second.clone()).await.unwrap();

    assert_eq!(registry.len(), 1);
    assert_eq!(first.closes(), 1);
    assert_eq!(second.closes(), 0);

    registry.dispatch(msg(Level::Info, "hello")).await;
    assert!(first.texts().is_empty());
    assert_eq!(second.texts(), vec!["hello"]);
}

#[tokio::test]
async fn test_unregister_closes_sink() {
    let registry = Registry::new();
    let sink = CaptureSink::new("console", Level::Info);
    registry.register(sink.clone()).await.unwrap();

    assert!(registry.unregister("console").await.unwrap());
    assert!(!registry.unregister("console").await.unwrap());
    assert_eq!(sink.closes(), 1);
    assert!(registry.is_empty());
}

// ============================================================================
// Dispatch Tests
// ============================================================================

#[tokio::test]
async fn test_dispatch_respects_thresholds() {
    let registry = Registry::new();
    let verbose = CaptureSink::new("verbose", Level::Verbose);
    let errors = CaptureSink::new("errors", Level::Error);
    registry.register(verbose.clone()).await.unwrap();
    registry.register(errors.clone()).await.unwrap();

    assert_eq!(registry.dispatch(msg(Level::Warn, "warn")).await, 1);
    assert_eq!(registry.dispatch(msg(Level::Fatal, "fatal")).await, 2);
    assert_eq!(registry.dispatch(msg(Level::Verbose, "chatty")).await, 1);

    assert_eq!(verbose.texts(), vec!["warn", "fatal", "chatty"]);
    assert_eq!(errors.texts(), vec!["fatal"]);
}

#[tokio::test]
async fn test_dispatch_shares_one_message() {
    let registry = Registry::new();
    let a = CaptureSink::new("a", Level::Info);
    let b = CaptureSink::new("b", Level::Info);
    registry.register(a.clone()).await.unwrap();
    registry.register(b.clone()).await.unwrap();

    registry.dispatch(msg(Level::Info, "shared")).await;
    assert!(Arc::ptr_eq(&a.messages()[0], &b.messages()[0]));
}

#[tokio::test]
async fn test_dispatch_drops_empty_text() {
    let registry = Registry::new();
    let sink = CaptureSink::new("all", Level::Trace);
    registry.register(sink.clone()).await.unwrap();

    assert_eq!(registry.dispatch(msg(Level::Error, "")).await, 0);
    assert!(sink.messages().is_empty());
    assert_eq!(registry.metrics().snapshot().messages_empty, 1);
}

#[tokio::test]
async fn test_release_mode_suppresses_development_levels() {
    let registry = Registry::with_mode(Mode::Release);
    let sink = CaptureSink::new("all", Level::Trace);
    registry.register(sink.clone()).await.unwrap();

    registry.dispatch(msg(Level::Debug, "debug")).await;
    registry.dispatch(msg(Level::Trace, "trace")).await;
    registry.dispatch(msg(Level::Verbose, "verbose")).await;

    assert_eq!(sink.texts(), vec!["verbose"]);
    assert!(!registry.is_enabled(Level::Debug));
    assert!(registry.is_enabled(Level::Verbose));

    let snapshot = registry.metrics().snapshot();
    assert_eq!(snapshot.messages_received, 3);
    assert_eq!(snapshot.messages_filtered, 2);
    assert_eq!(snapshot.messages_dispatched, 1);
}

#[tokio::test]
async fn test_debug_mode_dispatches_development_levels() {
    let registry = Registry::new();
    registry.set_mode("dev").unwrap();
    assert_eq!(registry.mode(), Mode::Debug);

    let sink = CaptureSink::new("all", Level::Trace);
    let info = CaptureSink::new("info", Level::Info);
    registry.register(sink.clone()).await.unwrap();
    registry.register(info.clone()).await.unwrap();

    registry.dispatch(msg(Level::Debug, "debug")).await;
    registry.dispatch(msg(Level::Trace, "trace")).await;

    assert_eq!(sink.texts(), vec!["debug", "trace"]);
    assert!(info.texts().is_empty());
}

#[tokio::test]
async fn test_set_mode_rejects_unknown() {
    let registry = Registry::with_mode(Mode::Debug);
    let err = registry.set_mode("loud").unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));
    assert_eq!(registry.mode(), Mode::Debug);

    registry.set_mode("release").unwrap();
    assert_eq!(registry.mode(), Mode::Release);
}

#[tokio::test]
async fn test_dispatch_without_sinks() {
    let registry = Registry::new();
    assert_eq!(registry.dispatch(msg(Level::Error, "nobody")).await, 0);
    assert_eq!(registry.metrics().snapshot().messages_filtered, 1);
}

// ============================================================================
// Formatter / Close Tests
// ============================================================================

#[tokio::test]
async fn test_set_formatter() {
    let registry = Registry::new();
    registry.register(CaptureSink::new("swap", Level::Info)).await.unwrap();
    registry.register(CaptureSink::fixed_format("fixed", Level::Info)).await.unwrap();

    assert!(registry.set_formatter("swap", Box::new(TextFormatter::new())).is_ok());
    assert!(matches!(
        registry.set_formatter("fixed", Box::new(TextFormatter::new())),
        Err(PipelineError::FormatterUnsupported(_))
    ));
    assert!(matches!(
        registry.set_formatter("missing", Box::new(TextFormatter::new())),
        Err(PipelineError::SinkNotRegistered(_))
    ));
}

#[tokio::test]
async fn test_close_closes_every_sink() {
    let registry = Registry::new();
    let a = CaptureSink::new("a", Level::Info);
    let b = CaptureSink::new("b", Level::Info);
    registry.register(a.clone()).await.unwrap();
    registry.register(b.clone()).await.unwrap();

    registry.close().await.unwrap();

    assert_eq!(a.closes(), 1);
    assert_eq!(b.closes(), 1);
    assert!(registry.is_empty());
    assert_eq!(registry.dispatch(msg(Level::Error, "after")).await, 0);
}

#[tokio::test]
async fn test_close_collects_failures() {
    let registry = Registry::new();
    let ok = CaptureSink::new("ok", Level::Info);
    registry.register(ok.clone()).await.unwrap();
    registry.register(Arc::new(FailingSink("broken"))).await.unwrap();

    let err = registry.close().await.unwrap_err();
    match err {
        PipelineError::Close(failures) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].0, "broken");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(ok.closes(), 1);
}
