//! Pipeline error types
//!
//! Error types for sink registration, dispatch settings and shutdown.

use fanlog_config::ConfigError;
use fanlog_sinks::SinkError;
use thiserror::Error;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No sink registered under this name
    #[error("sink not registered: {0}")]
    SinkNotRegistered(String),

    /// Sink does not support replacing its formatter
    #[error("sink '{0}' does not support custom formatters")]
    FormatterUnsupported(String),

    /// A sink failed to open or close
    #[error("sink '{name}': {source}")]
    Sink {
        name: String,
        #[source]
        source: SinkError,
    },

    /// One or more sinks failed while closing the registry
    #[error("failed to close {} sink(s): {}", .0.len(), names(.0))]
    Close(Vec<(String, SinkError)>),

    /// Invalid configuration (mode string, facility, ...)
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl PipelineError {
    /// Wrap a sink error with the sink's name
    pub fn sink(name: impl Into<String>, source: SinkError) -> Self {
        Self::Sink {
            name: name.into(),
            source,
        }
    }
}

fn names(failures: &[(String, SinkError)]) -> String {
    failures
        .iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::SinkNotRegistered("file".into());
        assert!(err.to_string().contains("file"));

        let err = PipelineError::FormatterUnsupported("null".into());
        assert!(err.to_string().contains("null"));

        let err = PipelineError::sink("syslog", SinkError::connection("refused"));
        assert_eq!(err.to_string(), "sink 'syslog': connection error: refused");

        let err = PipelineError::Close(vec![
            ("a".into(), SinkError::init("x")),
            ("b".into(), SinkError::init("y")),
        ]);
        assert_eq!(err.to_string(), "failed to close 2 sink(s): a, b");

        let err = PipelineError::from(ConfigError::InvalidMode("loud".into()));
        assert!(err.to_string().contains("loud"));
    }
}
