//! Error types for sweep parsing and table I/O.
//!
//! Content problems never surface here: malformed rows and missing
//! statistics are recovered inside the parser. These errors cover the
//! filesystem, serialization and configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading inputs, writing outputs or loading config.
#[derive(Debug, Error)]
pub enum SweepError {
    /// A file or directory could not be read or written.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// CSV reading or writing failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A configuration value is out of its accepted range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl SweepError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias for results with [`SweepError`].
pub type Result<T> = std::result::Result<T, SweepError>;
