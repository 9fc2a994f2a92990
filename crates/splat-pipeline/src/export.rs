//! PLY export of a trained model.
//!
//! The trainer writes `point_cloud/iteration_<N>/point_cloud.ply`; export
//! copies one of those out, the highest `N` unless an iteration is given.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use splat_models::artifacts::{ITERATION_DIR_PREFIX, POINT_CLOUD_DIR_NAME, POINT_CLOUD_FILE_NAME};

use crate::error::{PipelineError, PipelineResult};
use crate::fs_utils::copy_file_atomic;

/// Copy a trained point cloud to `output` (default `<model>/point_cloud.ply`).
pub async fn export_ply(
    model_path: impl AsRef<Path>,
    output: Option<&Path>,
    iteration: Option<u32>,
) -> PipelineResult<PathBuf> {
    let model_path = model_path.as_ref();
    let point_cloud_dir = model_path.join(POINT_CLOUD_DIR_NAME);

    let iteration_dir = match iteration {
        Some(n) => point_cloud_dir.join(format!("{}{}", ITERATION_DIR_PREFIX, n)),
        None => latest_iteration_dir(&point_cloud_dir).await?,
    };

    let source_ply = iteration_dir.join(POINT_CLOUD_FILE_NAME);
    if !source_ply.is_file() {
        return Err(PipelineError::FileNotFound(source_ply));
    }

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| model_path.join(POINT_CLOUD_FILE_NAME));

    copy_file_atomic(&source_ply, &output).await?;
    info!("Exported PLY to: {}", output.display());
    Ok(output)
}

/// Highest-numbered `iteration_<N>` directory.
async fn latest_iteration_dir(point_cloud_dir: &Path) -> PipelineResult<PathBuf> {
    let mut entries = match fs::read_dir(point_cloud_dir).await {
        Ok(entries) => entries,
        Err(_) => return Err(PipelineError::FileNotFound(point_cloud_dir.to_path_buf())),
    };

    let mut latest: Option<(u32, PathBuf)> = None;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let Some(number) = name
            .to_str()
            .and_then(|n| n.strip_prefix(ITERATION_DIR_PREFIX))
            .and_then(|n| n.parse::<u32>().ok())
        else {
            continue;
        };
        if latest.as_ref().map_or(true, |(best, _)| number > *best) {
            latest = Some((number, entry.path()));
        }
    }

    latest
        .map(|(_, path)| path)
        .ok_or_else(|| PipelineError::FileNotFound(point_cloud_dir.to_path_buf()))
}
