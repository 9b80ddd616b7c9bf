//! Error types for the weaving engine.

use graft_model::ModelError;
use thiserror::Error;

/// An irregularity found while weaving, routed through the error policy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Anomaly {
    /// The interface template is not a plain, non-generic interface.
    #[error("structural mismatch: {0}")]
    StructuralMismatch(String),

    /// A member the weaver wants to add already exists on the target.
    #[error("name collision: {0}")]
    NameCollision(String),
}

/// Errors that abort a weaving job.
#[derive(Debug, Error)]
pub enum WeaveError {
    /// An anomaly handled with the terminate strategy.
    #[error("weaving terminated: {0}")]
    Terminated(Anomaly),

    /// An annotation could not be decoded.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The job names a type the unit does not define.
    #[error("target type '{type_name}' not found in unit '{unit}'")]
    UnknownTargetType { type_name: String, unit: String },

    /// A synthesized call would forward more arguments than a body can address.
    #[error("method '{method}' has {count} parameters, more than a body can forward")]
    TooManyParameters { method: String, count: usize },
}

impl WeaveError {
    /// Whether this is the abort signal produced by the terminate strategy.
    pub fn is_termination(&self) -> bool {
        matches!(self, WeaveError::Terminated(_))
    }
}

/// Convenience result type for weaving operations.
pub type WeaveResult<T> = Result<T, WeaveError>;
