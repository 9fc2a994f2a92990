//! COLMAP invocations for feature extraction and matching.
//!
//! Mapping commands live with the backend that runs them, see
//! [`crate::backend::MappingBackend::mapper_command`].

use std::path::Path;

use splat_models::{CameraModel, QualityParameters};

use crate::command::ToolCommand;
use crate::config::SfmToolConfig;
use crate::layout::ArtifactLayout;

/// `colmap feature_extractor`: creates and fills the feature database.
pub fn feature_extraction_command(
    tools: &SfmToolConfig,
    layout: &ArtifactLayout,
    image_dir: &Path,
    camera_model: CameraModel,
    use_gpu: bool,
    params: QualityParameters,
) -> ToolCommand {
    ToolCommand::new(&tools.colmap_program)
        .subcommand("feature_extractor")
        .path_option("database_path", &layout.database_path())
        .path_option("image_path", image_dir)
        .option("ImageReader.camera_model", camera_model.as_str())
        .option("ImageReader.single_camera", u8::from(tools.single_camera))
        .option_if(use_gpu, "SiftExtraction.use_gpu", 1)
        .option("SiftExtraction.max_image_size", params.max_image_size)
        .option("SiftExtraction.max_num_features", params.max_num_features)
}

/// `colmap exhaustive_matcher`: matches every image pair in the database.
///
/// Cost grows quadratically with the number of frames.
pub fn matching_command(tools: &SfmToolConfig, layout: &ArtifactLayout, use_gpu: bool) -> ToolCommand {
    ToolCommand::new(&tools.colmap_program)
        .subcommand("exhaustive_matcher")
        .path_option("database_path", &layout.database_path())
        .option_if(use_gpu, "SiftMatching.use_gpu", 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use splat_models::QualityTier;

    #[test]
    fn test_feature_extraction_args() {
        let layout = ArtifactLayout::new("/data/colmap");
        let cmd = feature_extraction_command(
            &SfmToolConfig::default(),
            &layout,
            Path::new("/data/frames"),
            CameraModel::Pinhole,
            true,
            QualityTier::Low.parameters(),
        );

        assert_eq!(cmd.invocation(), "colmap feature_extractor");
        assert_eq!(cmd.option_value("database_path"), Some("/data/colmap/database.db"));
        assert_eq!(cmd.option_value("image_path"), Some("/data/frames"));
        assert_eq!(cmd.option_value("ImageReader.camera_model"), Some("PINHOLE"));
        assert_eq!(cmd.option_value("ImageReader.single_camera"), Some("1"));
        assert_eq!(cmd.option_value("SiftExtraction.use_gpu"), Some("1"));
        assert_eq!(cmd.option_value("SiftExtraction.max_image_size"), Some("1024"));
        assert_eq!(cmd.option_value("SiftExtraction.max_num_features"), Some("2048"));
    }

    #[test]
    fn test_matching_without_gpu() {
        let layout = ArtifactLayout::new("/data/colmap");
        let tools = SfmToolConfig::default().with_colmap("/opt/colmap/bin/colmap");
        let cmd = matching_command(&tools, &layout, false);

        assert_eq!(cmd.program(), "/opt/colmap/bin/colmap");
        assert_eq!(cmd.get_subcommand(), Some("exhaustive_matcher"));
        assert_eq!(cmd.option_value("SiftMatching.use_gpu"), None);
    }
}
