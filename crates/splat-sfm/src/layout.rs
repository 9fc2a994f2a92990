//! On-disk artifact layout for a reconstruction run.
//!
//! ```text
//! <output_dir>/
//!   database.db
//!   sparse/
//!     0/
//!     1/      (only when the mapper produced several models)
//! ```
//!
//! Nothing here deletes files; a rerun into the same directory overwrites
//! whatever the tools overwrite.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use splat_models::artifacts::{DATABASE_FILE_NAME, SPARSE_DIR_NAME};

use crate::error::{SfmError, SfmResult};

/// Paths owned by one reconstruction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    root: PathBuf,
}

impl ArtifactLayout {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Feature database written by extraction and updated by matching.
    pub fn database_path(&self) -> PathBuf {
        self.root.join(DATABASE_FILE_NAME)
    }

    /// Parent of the numbered model directories.
    pub fn sparse_dir(&self) -> PathBuf {
        self.root.join(SPARSE_DIR_NAME)
    }

    /// Create the output root and `sparse/`, including missing parents.
    pub async fn prepare(&self) -> SfmResult<()> {
        fs::create_dir_all(self.sparse_dir()).await?;
        Ok(())
    }

    /// Immediate subdirectories of `sparse/`, in selection order.
    pub async fn list_models(&self) -> SfmResult<Vec<PathBuf>> {
        let sparse_dir = self.sparse_dir();
        let mut entries = match fs::read_dir(&sparse_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut models = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                models.push(entry.path());
            }
        }

        models.sort_by(|a, b| compare_model_names(file_name(a), file_name(b)));
        Ok(models)
    }

    /// List models and pick the primary one: the first non-empty model
    /// directory in selection order.
    pub async fn collect_models(&self) -> SfmResult<(PathBuf, Vec<PathBuf>)> {
        let models = self.list_models().await?;

        for model in &models {
            if dir_has_entries(model).await? {
                return Ok((model.clone(), models));
            }
            debug!("Skipping empty model directory {}", model.display());
        }

        Err(SfmError::ReconstructionProducedNoOutput(self.sparse_dir()))
    }
}

/// Check that the frame directory exists and holds at least one file.
///
/// Returns the number of files, counting symlinks by their target. Dangling
/// links are skipped. File names are not inspected.
pub async fn validate_image_dir(image_dir: &Path) -> SfmResult<usize> {
    let mut entries = match fs::read_dir(image_dir).await {
        Ok(entries) => entries,
        Err(_) => return Err(SfmError::InputNotFound(image_dir.to_path_buf())),
    };

    let mut count = 0;
    while let Some(entry) = entries.next_entry().await? {
        match fs::metadata(entry.path()).await {
            Ok(meta) if meta.is_file() => count += 1,
            Ok(_) => {}
            Err(e) => debug!("Skipping unreadable entry {}: {}", entry.path().display(), e),
        }
    }

    if count == 0 {
        return Err(SfmError::InputNotFound(image_dir.to_path_buf()));
    }
    Ok(count)
}

async fn dir_has_entries(dir: &Path) -> SfmResult<bool> {
    let mut entries = fs::read_dir(dir).await?;
    Ok(entries.next_entry().await?.is_some())
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
}

/// Numeric names first, in numeric order (`2` before `10`), then the rest
/// lexicographically.
fn compare_model_names(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
