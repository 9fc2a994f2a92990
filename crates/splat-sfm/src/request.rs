//! Reconstruction inputs and outputs.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use splat_models::{CameraModel, MappingBackendKind, QualityTier};

/// Everything a single reconstruction run needs. Not modified by the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconstructionRequest {
    /// Directory of extracted frames
    pub image_dir: PathBuf,
    /// Root for `database.db` and `sparse/`
    pub output_dir: PathBuf,
    pub camera_model: CameraModel,
    pub quality: QualityTier,
    /// Let COLMAP use the GPU for SIFT extraction and matching
    pub use_gpu: bool,
    /// Try GLOMAP before the COLMAP mapper
    pub prefer_fast_backend: bool,
}

impl ReconstructionRequest {
    /// Create a request with default options: `OPENCV`, high quality, GPU on,
    /// fast backend preferred.
    pub fn new(image_dir: impl AsRef<Path>, output_dir: impl AsRef<Path>) -> Self {
        Self {
            image_dir: image_dir.as_ref().to_path_buf(),
            output_dir: output_dir.as_ref().to_path_buf(),
            camera_model: CameraModel::default(),
            quality: QualityTier::default(),
            use_gpu: true,
            prefer_fast_backend: true,
        }
    }

    pub fn with_camera_model(mut self, camera_model: CameraModel) -> Self {
        self.camera_model = camera_model;
        self
    }

    pub fn with_quality(mut self, quality: QualityTier) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_gpu(mut self, use_gpu: bool) -> Self {
        self.use_gpu = use_gpu;
        self
    }

    pub fn with_fast_backend(mut self, prefer_fast_backend: bool) -> Self {
        self.prefer_fast_backend = prefer_fast_backend;
        self
    }
}

/// Non-fatal conditions raised during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReconstructionWarning {
    /// The fast mapper was requested but its executable was not found.
    BackendUnavailable { program: String },
}

impl std::fmt::Display for ReconstructionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconstructionWarning::BackendUnavailable { program } => {
                write!(f, "{} not found, falling back to COLMAP mapper", program)
            }
        }
    }
}

/// Output of a successful run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconstructionResult {
    /// Model directory the trainer should use (`sparse/<N>`)
    pub primary: PathBuf,
    /// Every model directory under `sparse/`, in selection order
    pub models: Vec<PathBuf>,
    pub database_path: PathBuf,
    pub sparse_dir: PathBuf,
    /// Mapper that produced the models
    pub backend: MappingBackendKind,
    pub warnings: Vec<ReconstructionWarning>,
}
