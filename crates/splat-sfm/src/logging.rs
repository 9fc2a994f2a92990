//! Run logging.
//!
//! A [`RunLogger`] stamps every event with a run id and operation name. Each
//! stage opens with a `==== Title ====` banner so a failure can be attributed
//! from the log alone, and the closing event carries the elapsed time.

use std::time::Instant;

use tracing::{error, info, warn, Span};
use uuid::Uuid;

use splat_models::{MappingBackendKind, PipelineStage};

/// Logger for one run of an operation (`reconstruction`, `training`, ...).
#[derive(Debug, Clone)]
pub struct RunLogger {
    run_id: String,
    operation: &'static str,
    started: Instant,
}

impl RunLogger {
    pub fn new(operation: &'static str) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            operation,
            started: Instant::now(),
        }
    }

    /// Span carrying the run id, for instrumenting the run's future.
    pub fn span(&self) -> Span {
        tracing::info_span!("run", run_id = %self.run_id, operation = self.operation)
    }

    pub fn started(&self, summary: &str) {
        info!(run_id = %self.run_id, operation = self.operation, "Starting {}: {}", self.operation, summary);
    }

    /// Banner for `stage`; mapping is titled after the backend that runs it.
    pub fn stage(&self, stage: PipelineStage, backend: Option<MappingBackendKind>) {
        info!(
            run_id = %self.run_id,
            operation = self.operation,
            stage = stage.as_str(),
            "{}",
            section_header(stage_title(stage, backend))
        );
    }

    pub fn note(&self, message: &str) {
        info!(run_id = %self.run_id, operation = self.operation, "{}", message);
    }

    pub fn warning(&self, message: &str) {
        warn!(run_id = %self.run_id, operation = self.operation, "Warning: {}", message);
    }

    pub fn failed(&self, message: &str) {
        error!(
            run_id = %self.run_id,
            operation = self.operation,
            elapsed_secs = self.started.elapsed().as_secs_f64(),
            "{} failed: {}",
            self.operation,
            message
        );
    }

    pub fn finished(&self, summary: &str) {
        info!(
            run_id = %self.run_id,
            operation = self.operation,
            elapsed_secs = self.started.elapsed().as_secs_f64(),
            "Finished {} in {:.1}s: {}",
            self.operation,
            self.started.elapsed().as_secs_f64(),
            summary
        );
    }
}

/// Banner title for a stage.
pub fn stage_title(stage: PipelineStage, backend: Option<MappingBackendKind>) -> &'static str {
    match (stage, backend) {
        (PipelineStage::Mapping, Some(MappingBackendKind::Fast)) => "GLOMAP Sparse Reconstruction",
        (PipelineStage::Mapping, Some(MappingBackendKind::Reliable)) => "COLMAP Sparse Reconstruction",
        _ => stage.title(),
    }
}

pub fn section_header(title: &str) -> String {
    format!("==== {} ====", title)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_title_names_mapper() {
        assert_eq!(
            stage_title(PipelineStage::Mapping, Some(MappingBackendKind::Fast)),
            "GLOMAP Sparse Reconstruction"
        );
        assert_eq!(
            stage_title(PipelineStage::Mapping, Some(MappingBackendKind::Reliable)),
            "COLMAP Sparse Reconstruction"
        );
        assert_eq!(
            stage_title(PipelineStage::Matching, None),
            "COLMAP Feature Matching"
        );
    }

    #[test]
    fn test_section_header() {
        assert_eq!(
            section_header(stage_title(PipelineStage::Training, None)),
            "==== Gaussian Splatting Training ===="
        );
    }
}
