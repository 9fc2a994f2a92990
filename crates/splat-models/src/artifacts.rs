//! File and directory names shared between pipeline stages.
//!
//! The reconstruction stage writes `<output>/database.db` and
//! `<output>/sparse/<N>/`; the trainer reads `sparse/<N>/` from the same root.

/// Feature database file name inside the reconstruction output directory.
pub const DATABASE_FILE_NAME: &str = "database.db";

/// Directory holding the numbered sparse models.
pub const SPARSE_DIR_NAME: &str = "sparse";

/// Extracted frame file name pattern (ffmpeg syntax).
pub const FRAME_FILE_PATTERN: &str = "frame_%06d.jpg";

/// Prefix shared by all extracted frame files.
pub const FRAME_FILE_PREFIX: &str = "frame_";

/// Directory under a trained model that holds per-iteration point clouds.
pub const POINT_CLOUD_DIR_NAME: &str = "point_cloud";

/// Prefix of the per-iteration point cloud directories.
pub const ITERATION_DIR_PREFIX: &str = "iteration_";

/// Point cloud file written by the trainer.
pub const POINT_CLOUD_FILE_NAME: &str = "point_cloud.ply";
