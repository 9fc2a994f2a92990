//! Pipeline configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use splat_sfm::SfmToolConfig;

/// External programs and default locations.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// COLMAP executable
    pub colmap_program: String,
    /// GLOMAP executable
    pub glomap_program: String,
    /// FFmpeg executable
    pub ffmpeg_program: String,
    /// FFprobe executable
    pub ffprobe_program: String,
    /// Python interpreter that runs the trainer
    pub python_program: String,
    /// Gaussian Splatting `train.py`
    pub train_script: PathBuf,
    /// Timeout for environment probe commands (not applied to pipeline stages)
    pub probe_timeout: Duration,
    /// Root for default input/output directories
    pub data_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            colmap_program: "colmap".to_string(),
            glomap_program: "glomap".to_string(),
            ffmpeg_program: "ffmpeg".to_string(),
            ffprobe_program: "ffprobe".to_string(),
            python_program: "python3".to_string(),
            train_script: PathBuf::from("/workspace/gaussian-splatting/train.py"),
            probe_timeout: Duration::from_secs(5),
            data_dir: PathBuf::from("data"),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            colmap_program: std::env::var("SPLAT_COLMAP_BIN").unwrap_or(defaults.colmap_program),
            glomap_program: std::env::var("SPLAT_GLOMAP_BIN").unwrap_or(defaults.glomap_program),
            ffmpeg_program: std::env::var("SPLAT_FFMPEG_BIN").unwrap_or(defaults.ffmpeg_program),
            ffprobe_program: std::env::var("SPLAT_FFPROBE_BIN").unwrap_or(defaults.ffprobe_program),
            python_program: std::env::var("SPLAT_PYTHON_BIN").unwrap_or(defaults.python_program),
            train_script: std::env::var("SPLAT_TRAIN_SCRIPT")
                .map(PathBuf::from)
                .unwrap_or(defaults.train_script),
            probe_timeout: Duration::from_secs(
                std::env::var("SPLAT_PROBE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
            data_dir: std::env::var("SPLAT_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
        }
    }

    /// Tool settings for the reconstruction core.
    pub fn sfm_tools(&self) -> SfmToolConfig {
        SfmToolConfig::default()
            .with_colmap(&self.colmap_program)
            .with_glomap(&self.glomap_program)
    }

    /// Default frame directory (`<data>/processed/frames`).
    pub fn frames_dir(&self) -> PathBuf {
        self.data_dir.join("processed").join("frames")
    }

    /// Default reconstruction directory (`<data>/processed/colmap`).
    pub fn colmap_dir(&self) -> PathBuf {
        self.data_dir.join("processed").join("colmap")
    }

    /// Default trained model directory (`<data>/output/splats/model`).
    pub fn model_dir(&self) -> PathBuf {
        self.data_dir.join("output").join("splats").join("model")
    }

    pub fn with_data_dir(mut self, data_dir: impl AsRef<Path>) -> Self {
        self.data_dir = data_dir.as_ref().to_path_buf();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directories() {
        let config = PipelineConfig::default().with_data_dir("/srv/data");
        assert_eq!(config.frames_dir(), PathBuf::from("/srv/data/processed/frames"));
        assert_eq!(config.colmap_dir(), PathBuf::from("/srv/data/processed/colmap"));
        assert_eq!(config.model_dir(), PathBuf::from("/srv/data/output/splats/model"));
    }

    #[test]
    fn test_sfm_tools_follow_config() {
        let config = PipelineConfig {
            colmap_program: "/opt/colmap".to_string(),
            glomap_program: "/opt/glomap".to_string(),
            ..Default::default()
        };
        let tools = config.sfm_tools();
        assert_eq!(tools.colmap_program, "/opt/colmap");
        assert_eq!(tools.glomap_program, "/opt/glomap");
        assert!(tools.single_camera);
    }
}
