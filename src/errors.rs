//! Error conditions callers need to tell apart.
//!
//! Everything else travels as `anyhow::Error` with context attached.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A directory or report a step depends on is absent. The step is skipped.
    #[error("{what} does not exist: {}", path.display())]
    MissingInput { what: &'static str, path: PathBuf },

    /// `params.analysis_type` names an analysis this tool does not know.
    #[error("Invalid analysis type: {0}")]
    UnknownAnalysisType(String),
}

impl PipelineError {
    pub fn missing(what: &'static str, path: impl Into<PathBuf>) -> Self {
        PipelineError::MissingInput { what, path: path.into() }
    }
}

/// True when `err` is (or wraps) a [`PipelineError::MissingInput`].
pub fn is_missing_input(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::MissingInput { .. })
    )
}
