//! Error types for reconstruction.

use std::path::PathBuf;
use thiserror::Error;

use splat_models::{MappingBackendKind, PipelineStage};

use crate::command::ExitFailure;

/// Result type for reconstruction operations.
pub type SfmResult<T> = Result<T, SfmError>;

/// Errors that abort a reconstruction run.
#[derive(Debug, Error)]
pub enum SfmError {
    #[error("Input images not found or empty: {0}")]
    InputNotFound(PathBuf),

    #[error("Invalid quality tier: {0}")]
    InvalidQualityTier(String),

    #[error("{stage} failed{via}: {message}", via = backend_suffix(.backend))]
    ExternalToolFailure {
        stage: PipelineStage,
        backend: Option<MappingBackendKind>,
        exit_code: Option<i32>,
        message: String,
    },

    #[error("Reconstruction produced no output in {0}")]
    ReconstructionProducedNoOutput(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn backend_suffix(backend: &Option<MappingBackendKind>) -> String {
    match backend {
        Some(kind) => format!(" ({} backend)", kind),
        None => String::new(),
    }
}

impl SfmError {
    /// Create an external tool failure from a process exit failure.
    pub fn tool_failed(
        stage: PipelineStage,
        backend: Option<MappingBackendKind>,
        failure: ExitFailure,
    ) -> Self {
        Self::ExternalToolFailure {
            stage,
            backend,
            exit_code: failure.exit_code,
            message: failure.message,
        }
    }

    /// Stage that failed, for external tool failures.
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            Self::ExternalToolFailure { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Exit code of the failed tool, if it exited normally.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::ExternalToolFailure { exit_code, .. } => *exit_code,
            _ => None,
        }
    }
}

impl From<splat_models::QualityTierParseError> for SfmError {
    fn from(err: splat_models::QualityTierParseError) -> Self {
        Self::InvalidQualityTier(err.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_failure_display() {
        let err = SfmError::tool_failed(
            PipelineStage::Mapping,
            Some(MappingBackendKind::Fast),
            ExitFailure::new(Some(1), "glomap exited with exit status: 1"),
        );
        assert_eq!(
            err.to_string(),
            "mapping failed (fast backend): glomap exited with exit status: 1"
        );
        assert_eq!(err.stage(), Some(PipelineStage::Mapping));
        assert_eq!(err.exit_code(), Some(1));

        let err = SfmError::tool_failed(
            PipelineStage::Matching,
            None,
            ExitFailure::new(None, "killed"),
        );
        assert_eq!(err.to_string(), "matching failed: killed");
        assert_eq!(err.exit_code(), None);
    }
}
