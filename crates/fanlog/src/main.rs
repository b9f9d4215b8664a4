//! fanlog - Fan log lines out to console, rotating files and syslog
//!
//! # Usage
//!
//! ```bash
//! # Pipe stdin through the configured sinks (default)
//! my-server | fanlog
//! my-server | fanlog --config configs/fanlog.toml pipe --level warn
//!
//! # Validate a config and list its sinks
//! fanlog check --config configs/fanlog.toml
//! ```

mod cmd;

use anyhow::Result;
use clap::{Parser, Subcommand};
use fanlog_config::{Config, LogFormat};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// fanlog - Fan log lines out to console, rotating files and syslog
#[derive(Parser, Debug)]
#[command(name = "fanlog")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (error if specified but not found)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Diagnostics level (trace, debug, info, warn, error). Overrides config file.
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read lines from stdin and dispatch each one (default)
    Pipe(cmd::pipe::PipeArgs),

    /// Validate the configuration and list enabled sinks
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cmd::load_config(cli.config.as_deref())?;

    match cli.command {
        Some(Command::Pipe(args)) => {
            init_logging(cli.log_level.as_deref(), &config)?;
            cmd::pipe::run(args, config).await
        }
        Some(Command::Check) => {
            // Check doesn't need logging - just outputs to stdout
            cmd::check::run(&config)
        }
        // No subcommand = pipe with defaults
        None => {
            init_logging(cli.log_level.as_deref(), &config)?;
            cmd::pipe::run(cmd::pipe::PipeArgs::default(), config).await
        }
    }
}

/// Initialize the tracing subscriber for fanlog's own diagnostics
///
/// Level: CLI flag > `[log]` section > "info". Output goes to stderr so it
/// never mixes with a console sink on stdout.
fn init_logging(cli_level: Option<&str>, config: &Config) -> Result<()> {
    let level = cli_level.unwrap_or(config.log.level.as_str());
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    match config.log.format {
        LogFormat::Console => tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init(),
    }

    Ok(())
}
