//! Shared data models for the Gaussian Splatting pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Quality tiers and the SIFT parameters they resolve to
//! - COLMAP camera models
//! - Mapping backends and pipeline stages
//! - The on-disk artifact naming contract

pub mod artifacts;
pub mod backend;
pub mod camera;
pub mod quality;
pub mod stage;

pub use backend::MappingBackendKind;
pub use camera::{CameraModel, CameraModelParseError};
pub use quality::{QualityParameters, QualityTier, QualityTierParseError};
pub use stage::PipelineStage;
