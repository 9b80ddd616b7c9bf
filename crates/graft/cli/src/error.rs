//! Error types for the graft CLI

use thiserror::Error;

/// CLI-level errors
#[derive(Debug, Error)]
pub enum CliError {
    /// Preloader error (configuration, unit access, weaving)
    #[error(transparent)]
    Preloader(#[from] graft_preloader::PreloaderError),

    /// Output could not be rendered
    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),

    /// The batch ran but reported a failure
    #[error("Batch {0} failed, patched units were not written")]
    BatchFailed(String),
}

pub type CliResult<T> = Result<T, CliError>;
