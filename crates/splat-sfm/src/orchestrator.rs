//! Reconstruction orchestrator.
//!
//! Runs feature extraction, exhaustive matching and sparse mapping strictly in
//! sequence. Any failure aborts the run; nothing is retried or resumed.

use std::time::Instant;

use tracing::Instrument;

use splat_models::{MappingBackendKind, PipelineStage};

use crate::adapter::{feature_extraction_command, matching_command};
use crate::availability::ToolAvailability;
use crate::backend::select_backend;
use crate::command::{ExternalProcess, ToolCommand};
use crate::config::SfmToolConfig;
use crate::error::{SfmError, SfmResult};
use crate::layout::{validate_image_dir, ArtifactLayout};
use crate::logging::RunLogger;
use crate::request::{ReconstructionRequest, ReconstructionResult};

/// Drives the external SfM tools for one request at a time.
///
/// Concurrent runs targeting the same output directory are not supported.
pub struct Reconstructor<P, A> {
    process: P,
    availability: A,
    tools: SfmToolConfig,
}

impl<P, A> Reconstructor<P, A>
where
    P: ExternalProcess,
    A: ToolAvailability,
{
    pub fn new(process: P, availability: A, tools: SfmToolConfig) -> Self {
        Self {
            process,
            availability,
            tools,
        }
    }

    pub fn process(&self) -> &P {
        &self.process
    }

    pub fn tools(&self) -> &SfmToolConfig {
        &self.tools
    }

    /// Reconstruct sparse models from the frames in `request.image_dir`.
    pub async fn reconstruct(&self, request: &ReconstructionRequest) -> SfmResult<ReconstructionResult> {
        let logger = RunLogger::new("reconstruction");
        let span = logger.span();

        let result = self.run(request, &logger).instrument(span).await;
        if let Err(ref e) = result {
            logger.failed(&e.to_string());
        }
        result
    }

    async fn run(&self, request: &ReconstructionRequest, logger: &RunLogger) -> SfmResult<ReconstructionResult> {
        let image_count = validate_image_dir(&request.image_dir).await?;
        logger.started(&format!(
            "{} images from {}, quality={}, camera={}, gpu={}",
            image_count,
            request.image_dir.display(),
            request.quality,
            request.camera_model,
            request.use_gpu
        ));

        let layout = ArtifactLayout::new(&request.output_dir);
        layout.prepare().await?;

        let params = request.quality.parameters();

        logger.stage(PipelineStage::FeatureExtraction, None);
        let cmd = feature_extraction_command(
            &self.tools,
            &layout,
            &request.image_dir,
            request.camera_model,
            request.use_gpu,
            params,
        );
        self.run_stage(PipelineStage::FeatureExtraction, None, &cmd).await?;

        logger.stage(PipelineStage::Matching, None);
        let cmd = matching_command(&self.tools, &layout, request.use_gpu);
        self.run_stage(PipelineStage::Matching, None, &cmd).await?;

        let selection = select_backend(request.prefer_fast_backend, &self.tools, &self.availability);
        let mut warnings = Vec::new();
        if let Some(warning) = selection.warning {
            logger.warning(&warning.to_string());
            metrics::counter!("sfm_backend_fallback_total").increment(1);
            warnings.push(warning);
        }

        let backend = selection.backend;
        logger.stage(PipelineStage::Mapping, Some(backend.kind()));
        let cmd = backend.mapper_command(&layout, &request.image_dir);
        self.run_stage(PipelineStage::Mapping, Some(backend.kind()), &cmd)
            .await?;

        let (primary, models) = layout.collect_models().await?;
        logger.finished(&format!(
            "reconstruction saved to {} ({} model(s), {} backend)",
            primary.display(),
            models.len(),
            backend.kind()
        ));

        Ok(ReconstructionResult {
            primary,
            models,
            database_path: layout.database_path(),
            sparse_dir: layout.sparse_dir(),
            backend: backend.kind(),
            warnings,
        })
    }

    async fn run_stage(
        &self,
        stage: PipelineStage,
        backend: Option<MappingBackendKind>,
        cmd: &ToolCommand,
    ) -> SfmResult<()> {
        let start = Instant::now();
        let outcome = self.process.run(cmd).await;

        metrics::histogram!("sfm_stage_duration_seconds", "stage" => stage.as_str())
            .record(start.elapsed().as_secs_f64());
        let label = if outcome.is_ok() { "success" } else { "failure" };
        metrics::counter!("sfm_stage_total", "stage" => stage.as_str(), "outcome" => label)
            .increment(1);

        outcome.map_err(|failure| SfmError::tool_failed(stage, backend, failure))
    }
}
