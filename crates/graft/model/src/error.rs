//! Error types for the structural model.

use thiserror::Error;

/// Errors raised while reading or decoding the structural model.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// An annotation of a known kind carried arguments of the wrong shape.
    #[error("malformed annotation '{kind}': {reason}")]
    MalformedAnnotation { kind: String, reason: String },

    /// A strategy annotation carried a value outside the known range.
    #[error("unknown error handling strategy value {0}")]
    UnknownStrategy(i64),
}

/// Convenience result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;
