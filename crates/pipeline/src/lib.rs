//! fanlog - Pipeline
//!
//! Connects callers to sinks.
//!
//! # Architecture
//!
//! ```text
//! [Logger] --Message--> [Registry] --Arc<Message>--> console
//!  macros                 mode +                 ├──> file
//!                        thresholds              └──> syslog
//! ```
//!
//! # Key Design
//!
//! - **Explicit registry**: owned by the application, no global state
//! - **Arc fan-out**: one allocation per message regardless of sink count
//! - **Blocking sends**: a full sink queue slows the caller down instead of
//!   dropping the message
//! - **Terminal actions**: `fatal` and `panic` exit only after delivery and
//!   shutdown of every sink
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use fanlog_config::Config;
//! use fanlog_pipeline::{Logger, build_registry};
//!
//! let config = Config::from_file("fanlog.toml")?;
//! let logger = Logger::new(Arc::new(build_registry(&config).await?));
//!
//! fanlog_pipeline::info!(logger, "listening on {}", addr).await;
//! logger.registry().close().await?;
//! ```

mod builder;
mod error;
mod logger;
mod macros;
mod metrics;
mod registry;

pub use builder::{build_registry, formatter, open_sink};
pub use error::{PipelineError, Result};
pub use logger::Logger;
pub use metrics::{MetricsSnapshot, RegistryMetrics};
pub use registry::Registry;

// Re-export key types from dependencies for convenience
pub use fanlog_config::Mode;
pub use fanlog_protocol::{CallSite, Fields, Level, Message};
pub use fanlog_sinks::Sink;

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod logger_test;
#[cfg(test)]
mod registry_test;
