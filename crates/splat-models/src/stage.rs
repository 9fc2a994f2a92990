//! Pipeline stage names used in errors, logs and metrics labels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A step that runs an external program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    FrameExtraction,
    FeatureExtraction,
    Matching,
    Mapping,
    Training,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::FrameExtraction => "frame_extraction",
            PipelineStage::FeatureExtraction => "feature_extraction",
            PipelineStage::Matching => "matching",
            PipelineStage::Mapping => "mapping",
            PipelineStage::Training => "training",
        }
    }

    /// Section title printed before the stage runs.
    pub fn title(&self) -> &'static str {
        match self {
            PipelineStage::FrameExtraction => "Frame Extraction",
            PipelineStage::FeatureExtraction => "COLMAP Feature Extraction",
            PipelineStage::Matching => "COLMAP Feature Matching",
            PipelineStage::Mapping => "Sparse Reconstruction",
            PipelineStage::Training => "Gaussian Splatting Training",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(PipelineStage::FeatureExtraction.to_string(), "feature_extraction");
        assert_eq!(PipelineStage::Matching.as_str(), "matching");
        assert_eq!(
            serde_json::to_string(&PipelineStage::Mapping).unwrap(),
            "\"mapping\""
        );
    }
}
