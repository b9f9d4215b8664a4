//! `format!`-style logging macros
//!
//! Each macro expands to the matching `Logger` method and yields its future:
//!
//! ```ignore
//! fanlog_pipeline::info!(logger, "listening on {}", addr).await;
//! fanlog_pipeline::trace!(logger, "state = {state:?}").await;
//! ```

/// Trace message with the caller's file, line and module path
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $logger.trace_at(
            $crate::CallSite::caller(::std::module_path!()),
            ::std::format!($($arg)+),
        )
    };
}

#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $logger.debug(::std::format!($($arg)+))
    };
}

#[macro_export]
macro_rules! verbose {
    ($logger:expr, $($arg:tt)+) => {
        $logger.verbose(::std::format!($($arg)+))
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $logger.info(::std::format!($($arg)+))
    };
}

#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $logger.warn(::std::format!($($arg)+))
    };
}

#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $logger.error(::std::format!($($arg)+))
    };
}
