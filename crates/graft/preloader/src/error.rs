//! Error types for graft-preloader

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by unit hosts.
#[derive(Debug, Error)]
pub enum HostError {
    /// The file is not a readable unit. Scanning skips it.
    #[error("Malformed unit {path}: {reason}")]
    MalformedInput { path: PathBuf, reason: String },

    /// IO error
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No unit of that name is available.
    #[error("Unit not found: {0}")]
    UnitNotFound(String),

    /// A unit could not be written.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HostError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether scanning may skip past this error.
    pub fn is_skippable(&self) -> bool {
        matches!(self, HostError::MalformedInput { .. })
    }
}

/// Result type for host operations
pub type HostResult<T> = Result<T, HostError>;

/// Preloader-level errors
#[derive(Debug, Error)]
pub enum PreloaderError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Host error
    #[error("Host error: {0}")]
    Host(#[from] HostError),
}

/// Result type for preloader operations
pub type PreloaderResult<T> = Result<T, PreloaderError>;
