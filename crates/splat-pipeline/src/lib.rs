//! Video to Gaussian Splat pipeline.
//!
//! This crate provides:
//! - Frame extraction from video via FFmpeg/FFprobe
//! - The training wrapper around the external Gaussian Splatting trainer
//! - PLY export of a trained model
//! - Environment checks for the external tools
//! - Configuration and the end-to-end pipeline used by the CLI

pub mod config;
pub mod envcheck;
pub mod error;
pub mod export;
pub mod frames;
pub mod fs_utils;
pub mod pipeline;
pub mod probe;
pub mod train;

pub use config::PipelineConfig;
pub use envcheck::{check_environment, EnvironmentReport, ToolCheck};
pub use error::{PipelineError, PipelineResult};
pub use export::export_ply;
pub use frames::{extract_frames, FrameExtractionRequest};
pub use pipeline::{run_pipeline, PipelineRunRequest, PipelineSummary, ProjectLayout};
pub use probe::{probe_video, VideoInfo};
pub use train::{train, TrainingRequest};
