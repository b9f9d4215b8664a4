//! File lifecycle utilities for the rotating file sink
//!
//! - **naming**: next filename and the archive family regex
//! - **archiver**: `.log` to single-entry `.tgz`
//! - **sweeper**: archive retention by count or age
//! - **rate_limited_logger**: throttled diagnostics for background failures
//!
//! ```text
//! [active .log] --rotate--> [closed .log] --archive--> [.tgz] --sweep--> (deleted)
//! ```

pub mod archiver;
pub mod naming;
pub mod rate_limited_logger;
pub mod sweeper;

pub use archiver::{ArchiveError, ArchiveFailure, ArchiveReport, Archiver};
pub use naming::{
    DEFAULT_TIME_LAYOUT, MAX_NAME_ATTEMPTS, NamingError, NamingPolicy, archive_name,
    current_binary_name,
};
pub use rate_limited_logger::{DEFAULT_LOG_INTERVAL, RateLimitedLogger};
pub use sweeper::{SweepPolicy, SweepReport, Sweeper};
