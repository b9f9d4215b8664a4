//! Config to registry wiring
//!
//! Turns the `[global]` and `[sinks.*]` sections into a ready `Registry`.
//! Sinks are opened in name order; if one fails, the ones already opened
//! are closed before the error is returned.

use std::sync::Arc;

use fanlog_config::{
    Config, ConsoleSinkConfig, FileSinkConfig, FormatterKind, SinkConfig, SyslogSinkConfig,
};
use fanlog_protocol::{Formatter, JsonFormatter, TextFormatter};
use fanlog_sinks::{
    ConsoleConfig, ConsoleSink, ConsoleTarget, Facility, FileConfig, FileSink, RotatePolicy, Sink,
    SinkError, SweepPolicy, SyslogConfig, SyslogSink,
};

use crate::error::{PipelineError, Result};
use crate::registry::Registry;

/// Build a registry with every enabled sink of `config`
pub async fn build_registry(config: &Config) -> Result<Registry> {
    let registry = Registry::with_mode(config.global.mode);

    for name in config.enabled_sinks() {
        let Some(sink_config) = config.sinks.get(&name) else {
            continue;
        };

        match open_sink(&name, sink_config).await {
            Ok(sink) => registry.register(sink).await?,
            Err(e) => {
                if let Err(close_err) = registry.close().await {
                    tracing::warn!(error = %close_err, "failed to close sinks after startup error");
                }
                return Err(PipelineError::sink(name, e));
            }
        }
    }

    tracing::info!(
        sinks = ?registry.names(),
        mode = %registry.mode(),
        "registry ready"
    );

    Ok(registry)
}

/// Open the sink described by `config` under `name`
pub async fn open_sink(
    name: &str,
    config: &SinkConfig,
) -> std::result::Result<Arc<dyn Sink>, SinkError> {
    let sink: Arc<dyn Sink> = match config {
        SinkConfig::Console(console) => {
            let sink = ConsoleSink::with_name(name, console_config(console));
            if console.formatter == FormatterKind::Json {
                sink.set_formatter(formatter(FormatterKind::Json));
            }
            Arc::new(sink)
        }
        SinkConfig::File(file) => {
            let sink = FileSink::open_named(name, file_config(file)).await?;
            if file.formatter == FormatterKind::Json {
                sink.set_formatter(formatter(FormatterKind::Json));
            }
            Arc::new(sink)
        }
        SinkConfig::Syslog(syslog) => {
            // `text` keeps the syslog default; the frame header has the time
            let sink = SyslogSink::connect_named(name, syslog_config(syslog)?).await?;
            if syslog.formatter == FormatterKind::Json {
                sink.set_formatter(formatter(FormatterKind::Json));
            }
            Arc::new(sink)
        }
    };
    Ok(sink)
}

/// Formatter for a configured kind
pub fn formatter(kind: FormatterKind) -> Box<dyn Formatter> {
    match kind {
        FormatterKind::Text => Box::new(TextFormatter::new()),
        FormatterKind::Json => Box::new(JsonFormatter::new()),
    }
}

fn console_config(config: &ConsoleSinkConfig) -> ConsoleConfig {
    ConsoleConfig {
        level: config.level,
        color: config.color,
        target: match config.target {
            fanlog_config::ConsoleTarget::Stdout => ConsoleTarget::Stdout,
            fanlog_config::ConsoleTarget::Stderr => ConsoleTarget::Stderr,
        },
    }
}

fn file_config(config: &FileSinkConfig) -> FileConfig {
    FileConfig {
        path: config.path.clone().into(),
        level: config.level,
        pattern: config.pattern.clone(),
        binary_name: None,
        rotate_policy: match config.rotate_policy {
            fanlog_config::RotatePolicy::Size => RotatePolicy::BySize(config.rotate_size),
            fanlog_config::RotatePolicy::Duration => {
                RotatePolicy::ByDuration(config.rotate_interval)
            }
        },
        sweep_policy: match config.sweep_policy {
            fanlog_config::SweepPolicy::Count => SweepPolicy::ByCount(config.sweep_count),
            fanlog_config::SweepPolicy::Age => SweepPolicy::ByAge(config.sweep_interval),
        },
        sweep_default_family: config.sweep_default_family,
        buffer_size: config.buffer_size,
        queue_size: config.queue_size,
        check_interval: config.check_interval,
        close_grace: config.close_grace,
    }
}

fn syslog_config(config: &SyslogSinkConfig) -> std::result::Result<SyslogConfig, SinkError> {
    let facility: Facility = config.facility.parse()?;
    Ok(SyslogConfig {
        level: config.level,
        address: config.address.parse()?,
        facility,
        tag: config.tag.clone(),
        queue_size: config.queue_size,
        close_grace: config.close_grace,
    })
}
