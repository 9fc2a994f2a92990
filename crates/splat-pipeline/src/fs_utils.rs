//! Filesystem helpers for publishing artifacts.

use std::path::Path;
use tokio::fs;

use crate::error::PipelineResult;

/// Copy `src` to `dst` so that `dst` is never observed half-written.
///
/// The copy goes to a temp file next to `dst` and is then renamed into place.
/// Missing parent directories of `dst` are created.
pub async fn copy_file_atomic(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> PipelineResult<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    if let Some(parent) = dst.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let tmp_dst = dst.with_extension("tmp");

    fs::copy(src, &tmp_dst).await.map_err(|e| {
        tracing::error!(
            "Failed to copy {} -> {}: {}",
            src.display(),
            tmp_dst.display(),
            e
        );
        e
    })?;

    if let Err(e) = fs::rename(&tmp_dst, dst).await {
        let _ = fs::remove_file(&tmp_dst).await;
        tracing::error!(
            "Failed to rename temp file {} -> {}: {}",
            tmp_dst.display(),
            dst.display(),
            e
        );
        return Err(e.into());
    }

    tracing::debug!("Copied {} -> {}", src.display(), dst.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_copy_into_new_subdirectory() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("source.ply");
        let dst = dir.path().join("exports").join("scene.ply");

        fs::write(&src, b"ply").await.unwrap();
        copy_file_atomic(&src, &dst).await.unwrap();

        assert!(src.exists(), "Source file should be kept");
        assert_eq!(fs::read(&dst).await.unwrap(), b"ply");
        assert!(!dst.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_copy_overwrites_destination() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("source.ply");
        let dst = dir.path().join("dest.ply");

        fs::write(&src, b"new").await.unwrap();
        fs::write(&dst, b"old").await.unwrap();
        copy_file_atomic(&src, &dst).await.unwrap();

        assert_eq!(fs::read_to_string(&dst).await.unwrap(), "new");
    }

    #[tokio::test]
    async fn test_copy_missing_source() {
        let dir = TempDir::new().unwrap();
        let result = copy_file_atomic(dir.path().join("nope.ply"), dir.path().join("out.ply")).await;
        assert!(result.is_err());
    }
}
