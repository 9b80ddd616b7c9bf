//! Error handling strategies.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// How an anomaly found while weaving is handled.
///
/// The numeric values are the ones carried by strategy annotations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorStrategy {
    /// Abort the current job and fail the whole batch.
    #[default]
    Terminate,
    /// Continue without logging.
    Ignore,
    /// Log a warning and continue.
    LogWarning,
    /// Log an error and continue.
    LogError,
}

impl ErrorStrategy {
    /// Decode the annotation value of a strategy.
    pub fn from_value(value: i64) -> ModelResult<Self> {
        match value {
            0 => Ok(Self::Terminate),
            1 => Ok(Self::Ignore),
            2 => Ok(Self::LogWarning),
            3 => Ok(Self::LogError),
            other => Err(ModelError::UnknownStrategy(other)),
        }
    }

    /// The annotation value of this strategy.
    pub fn value(self) -> i64 {
        match self {
            Self::Terminate => 0,
            Self::Ignore => 1,
            Self::LogWarning => 2,
            Self::LogError => 3,
        }
    }
}

impl std::fmt::Display for ErrorStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Terminate => write!(f, "terminate"),
            Self::Ignore => write!(f, "ignore"),
            Self::LogWarning => write!(f, "log-warning"),
            Self::LogError => write!(f, "log-error"),
        }
    }
}
