use thiserror::Error;

use crate::error::{DownsampleError, ExtractionError};

/// Failure of a single item. Never escapes the orchestrator; it becomes
/// the message of an `error` record.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Downsample(#[from] DownsampleError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("Processing aborted: {0}")]
    Aborted(String),
}

impl PipelineError {
    /// Builds an `Aborted` error from a caught panic payload.
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        PipelineError::Aborted(message)
    }
}
