//! Wrapper around the external Gaussian Splatting trainer.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use splat_models::PipelineStage;
use splat_sfm::{ExternalProcess, RunLogger, ToolCommand};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};

/// Parameters forwarded to `train.py`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingRequest {
    /// Reconstruction root (parent of `sparse/`)
    pub source_path: PathBuf,
    /// Output directory for the trained model
    pub model_path: PathBuf,
    pub iterations: u32,
    /// Downscale factor, 1 = full resolution
    pub resolution: u32,
    pub test_iterations: Vec<u32>,
    pub save_iterations: Vec<u32>,
    /// Empty means no checkpoints
    pub checkpoint_iterations: Vec<u32>,
}

impl TrainingRequest {
    pub fn new(source_path: impl AsRef<Path>, model_path: impl AsRef<Path>) -> Self {
        Self {
            source_path: source_path.as_ref().to_path_buf(),
            model_path: model_path.as_ref().to_path_buf(),
            iterations: 30_000,
            resolution: 1,
            test_iterations: vec![7_000, 30_000],
            save_iterations: vec![7_000, 30_000],
            checkpoint_iterations: Vec::new(),
        }
    }

    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }
}

/// Build the trainer invocation.
pub fn training_command(python: &str, train_script: &Path, request: &TrainingRequest) -> ToolCommand {
    let list = |values: &[u32]| values.iter().map(u32::to_string).collect::<Vec<_>>();

    let mut cmd = ToolCommand::new(python)
        .arg(train_script.to_string_lossy().to_string())
        .arg("-s")
        .arg(request.source_path.to_string_lossy().to_string())
        .arg("-m")
        .arg(request.model_path.to_string_lossy().to_string())
        .option("iterations", request.iterations)
        .option("resolution", request.resolution)
        .arg("--test_iterations")
        .args(list(&request.test_iterations))
        .arg("--save_iterations")
        .args(list(&request.save_iterations));

    if !request.checkpoint_iterations.is_empty() {
        cmd = cmd
            .arg("--checkpoint_iterations")
            .args(list(&request.checkpoint_iterations));
    }
    cmd
}

/// Train a model from a reconstruction.
pub async fn train<P>(process: &P, config: &PipelineConfig, request: &TrainingRequest) -> PipelineResult<()>
where
    P: ExternalProcess + ?Sized,
{
    if !request.source_path.exists() {
        return Err(PipelineError::FileNotFound(request.source_path.clone()));
    }
    fs::create_dir_all(&request.model_path).await?;

    let logger = RunLogger::new("training");
    logger.stage(PipelineStage::Training, None);
    info!("Source path: {}", request.source_path.display());
    info!("Model path: {}", request.model_path.display());
    info!("Iterations: {}", request.iterations);

    let cmd = training_command(&config.python_program, &config.train_script, request);
    process.run(&cmd).await.map_err(|failure| {
        logger.failed(&failure.message);
        PipelineError::TrainingFailed(failure)
    })?;

    logger.finished(&format!("model saved to {}", request.model_path.display()));
    Ok(())
}
