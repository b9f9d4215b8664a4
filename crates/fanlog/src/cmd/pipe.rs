//! Pipe command - dispatch stdin lines through the configured sinks
//!
//! Every line becomes one message at the chosen level. Blank lines are
//! skipped. Sinks are closed on end of input or Ctrl-C.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use fanlog_config::Config;
use fanlog_pipeline::{Logger, build_registry};
use fanlog_protocol::Level;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{info, warn};

/// Pipe command arguments
#[derive(Args, Debug, Default)]
pub struct PipeArgs {
    /// Level for every line (panic, fatal, error, warn, info, verbose, debug, trace)
    #[arg(short, long, default_value = "info")]
    pub level: Option<Level>,

    /// Dispatch mode override (debug, dev, devel, release)
    #[arg(short, long)]
    pub mode: Option<String>,

    /// Field attached to every message, as key=value (repeatable)
    #[arg(short, long = "field", value_parser = parse_field)]
    pub fields: Vec<(String, String)>,
}

/// Run the pipe command
pub async fn run(args: PipeArgs, config: Config) -> Result<()> {
    let registry = build_registry(&config)
        .await
        .context("failed to open sinks")?;
    if let Some(mode) = &args.mode {
        registry.set_mode(mode)?;
    }

    let level = args.level.unwrap_or(Level::Info);
    let mut logger = Logger::new(Arc::new(registry));
    for (key, value) in args.fields {
        logger = logger.with_field(key, value);
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        sinks = ?logger.registry().names(),
        level = %level,
        "fanlog piping stdin"
    );

    let lines = pipe_lines(&logger, level).await;

    info!(lines, "input finished, closing sinks");
    if let Err(e) = logger.registry().close().await {
        warn!(error = %e, "some sinks failed to close");
        return Err(e.into());
    }
    Ok(())
}

/// Dispatch stdin until end of input or Ctrl-C; returns lines dispatched
async fn pipe_lines(logger: &Logger, level: Level) -> u64 {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut count = 0u64;

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    logger.log(level, line).await;
                    count += 1;
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "failed to read stdin");
                    break;
                }
            },
            _ = signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
    }

    count
}

/// Parse a `key=value` field
fn parse_field(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}
