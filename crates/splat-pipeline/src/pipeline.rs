//! End-to-end pipeline: frames, reconstruction, training, export.
//!
//! Everything lives under one project directory laid out the way the
//! Gaussian Splatting trainer reads its source:
//!
//! ```text
//! <project>/images/frame_000000.jpg ...
//! <project>/database.db
//! <project>/sparse/0/...
//! <project>/model/point_cloud/iteration_<N>/point_cloud.ply
//! ```

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use splat_models::{CameraModel, QualityTier};
use splat_sfm::{
    ExternalProcess, ReconstructionRequest, ReconstructionResult, Reconstructor, RunLogger,
    ToolAvailability,
};

use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::export::export_ply;
use crate::frames::{count_frames, extract_frames, FrameExtractionRequest};
use crate::train::{train, TrainingRequest};

/// Directory layout of one pipeline project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Reconstruction root and training source.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join("images")
    }

    pub fn model_dir(&self) -> PathBuf {
        self.root.join("model")
    }
}

/// Options for a full pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineRunRequest {
    /// Source video; `None` reuses frames already in `<project>/images`
    pub video_path: Option<PathBuf>,
    pub project_dir: PathBuf,
    pub target_fps: Option<f64>,
    pub max_frames: Option<u32>,
    pub quality: QualityTier,
    pub camera_model: CameraModel,
    pub use_gpu: bool,
    pub prefer_fast_backend: bool,
    pub iterations: u32,
    /// Copy the final PLY here when set
    pub export_path: Option<PathBuf>,
}

impl PipelineRunRequest {
    pub fn new(video_path: Option<PathBuf>, project_dir: impl AsRef<Path>) -> Self {
        Self {
            video_path,
            project_dir: project_dir.as_ref().to_path_buf(),
            target_fps: None,
            max_frames: None,
            quality: QualityTier::default(),
            camera_model: CameraModel::default(),
            use_gpu: true,
            prefer_fast_backend: true,
            iterations: 30_000,
            export_path: None,
        }
    }
}

/// What a pipeline run produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineSummary {
    pub frame_count: usize,
    pub reconstruction: ReconstructionResult,
    pub model_dir: PathBuf,
    pub exported_ply: Option<PathBuf>,
}

/// Run every stage in order, stopping at the first failure.
pub async fn run_pipeline<P, A>(
    process: P,
    availability: A,
    config: &PipelineConfig,
    request: &PipelineRunRequest,
) -> PipelineResult<PipelineSummary>
where
    P: ExternalProcess,
    A: ToolAvailability,
{
    let logger = RunLogger::new("pipeline");
    let layout = ProjectLayout::new(&request.project_dir);
    logger.started(&format!("project {}", layout.root().display()));

    let frame_count = match &request.video_path {
        Some(video) => {
            let frames = FrameExtractionRequest::new(video, layout.images_dir())
                .with_fps(request.target_fps)
                .with_max_frames(request.max_frames);
            extract_frames(&process, config, &frames).await?
        }
        None => {
            logger.note("No video given, reusing existing frames");
            if layout.images_dir().is_dir() {
                count_frames(&layout.images_dir()).await?
            } else {
                0
            }
        }
    };

    let reconstructor = Reconstructor::new(process, availability, config.sfm_tools());
    let reconstruction_request = ReconstructionRequest::new(layout.images_dir(), layout.root())
        .with_camera_model(request.camera_model)
        .with_quality(request.quality)
        .with_gpu(request.use_gpu)
        .with_fast_backend(request.prefer_fast_backend);
    let reconstruction = reconstructor.reconstruct(&reconstruction_request).await?;
    info!("Primary model: {}", reconstruction.primary.display());

    let training = TrainingRequest::new(layout.root(), layout.model_dir())
        .with_iterations(request.iterations);
    train(reconstructor.process(), config, &training).await?;

    let exported_ply = match &request.export_path {
        Some(path) => Some(export_ply(layout.model_dir(), Some(path.as_path()), None).await?),
        None => None,
    };

    logger.finished(&format!("model at {}", layout.model_dir().display()));
    Ok(PipelineSummary {
        frame_count,
        reconstruction,
        model_dir: layout.model_dir(),
        exported_ply,
    })
}
