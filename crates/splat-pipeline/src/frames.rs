//! Frame extraction from video.
//!
//! Frames are decoded sequentially by FFmpeg and every `step`-th frame is
//! written as `frame_%06d.jpg`, numbered from zero.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tracing::{info, warn};

use splat_models::artifacts::{FRAME_FILE_PATTERN, FRAME_FILE_PREFIX};
use splat_sfm::{ExternalProcess, ToolCommand};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::probe::probe_video;

/// Default JPEG quality (0-100).
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Parameters for one extraction run.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameExtractionRequest {
    pub video_path: PathBuf,
    pub output_dir: PathBuf,
    /// Sample down to roughly this rate; `None` keeps every frame
    pub target_fps: Option<f64>,
    /// Stop after this many frames
    pub max_frames: Option<u32>,
    /// JPEG quality, 0-100
    pub jpeg_quality: u8,
}

impl FrameExtractionRequest {
    pub fn new(video_path: impl AsRef<Path>, output_dir: impl AsRef<Path>) -> Self {
        Self {
            video_path: video_path.as_ref().to_path_buf(),
            output_dir: output_dir.as_ref().to_path_buf(),
            target_fps: None,
            max_frames: None,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn with_fps(mut self, fps: Option<f64>) -> Self {
        self.target_fps = fps;
        self
    }

    pub fn with_max_frames(mut self, max_frames: Option<u32>) -> Self {
        self.max_frames = max_frames;
        self
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    fn validate(&self) -> PipelineResult<()> {
        if self.jpeg_quality > 100 {
            return Err(PipelineError::invalid_argument(format!(
                "JPEG quality must be 0-100, got {}",
                self.jpeg_quality
            )));
        }
        if let Some(fps) = self.target_fps {
            if fps.is_nan() || fps <= 0.0 {
                return Err(PipelineError::invalid_argument(format!(
                    "target fps must be positive, got {}",
                    fps
                )));
            }
        }
        if self.max_frames == Some(0) {
            return Err(PipelineError::invalid_argument("max frames must be at least 1"));
        }
        Ok(())
    }
}

/// Keep every `step`-th frame so the output rate approaches `target_fps`.
///
/// Sampling only ever reduces the rate.
pub fn frame_step(source_fps: f64, target_fps: Option<f64>) -> u32 {
    match target_fps {
        Some(target) if target > 0.0 && target < source_fps => {
            ((source_fps / target).floor() as u32).max(1)
        }
        _ => 1,
    }
}

/// Map JPEG quality 0-100 onto FFmpeg's MJPEG `-q:v` scale (31 worst, 2 best).
pub fn jpeg_qscale(quality: u8) -> u8 {
    let quality = u32::from(quality.min(100));
    (31 - (quality * 29 + 50) / 100) as u8
}

/// Build the FFmpeg invocation for an extraction run.
pub fn frame_extraction_command(ffmpeg: &str, request: &FrameExtractionRequest, step: u32) -> ToolCommand {
    let mut cmd = ToolCommand::new(ffmpeg)
        .args(["-y", "-v", "error", "-i"])
        .arg(request.video_path.to_string_lossy().to_string());

    if step > 1 {
        cmd = cmd
            .arg("-vf")
            .arg(format!("select=not(mod(n\\,{}))", step))
            .args(["-vsync", "vfr"]);
    }

    if let Some(max_frames) = request.max_frames {
        cmd = cmd.arg("-frames:v").arg(max_frames.to_string());
    }

    cmd.arg("-q:v")
        .arg(jpeg_qscale(request.jpeg_quality).to_string())
        .args(["-start_number", "0"])
        .arg(
            request
                .output_dir
                .join(FRAME_FILE_PATTERN)
                .to_string_lossy()
                .to_string(),
        )
}

/// Extract frames and return how many were written.
pub async fn extract_frames<P>(
    process: &P,
    config: &PipelineConfig,
    request: &FrameExtractionRequest,
) -> PipelineResult<usize>
where
    P: ExternalProcess + ?Sized,
{
    request.validate()?;

    if !request.video_path.exists() {
        return Err(PipelineError::FileNotFound(request.video_path.clone()));
    }
    which::which(&config.ffmpeg_program).map_err(|_| PipelineError::FfmpegNotFound)?;

    let info = probe_video(&config.ffprobe_program, &request.video_path).await?;
    info!("Video FPS: {:.3}", info.fps);
    match info.frame_count {
        Some(count) => info!("Total frames in video: {}", count),
        None => info!("Total frames in video: unknown ({:.1}s)", info.duration),
    }

    let step = frame_step(info.fps, request.target_fps);
    if step > 1 {
        info!(
            "Extracting every {} frame(s) to achieve ~{} FPS",
            step,
            request.target_fps.unwrap_or(info.fps)
        );
    }

    run_extraction(process, &config.ffmpeg_program, request, step).await
}

/// Run FFmpeg into `request.output_dir` and count the frames it wrote.
///
/// Frames already in the directory that FFmpeg did not rewrite are left in
/// place and not counted.
pub async fn run_extraction<P>(
    process: &P,
    ffmpeg: &str,
    request: &FrameExtractionRequest,
    step: u32,
) -> PipelineResult<usize>
where
    P: ExternalProcess + ?Sized,
{
    fs::create_dir_all(&request.output_dir).await?;
    let before = frame_snapshot(&request.output_dir).await?;

    let cmd = frame_extraction_command(ffmpeg, request, step);
    process
        .run(&cmd)
        .await
        .map_err(PipelineError::FrameExtractionFailed)?;

    let after = frame_snapshot(&request.output_dir).await?;
    let saved = after
        .iter()
        .filter(|(name, modified)| before.get(*name) != Some(*modified))
        .count();
    let stale = after.len() - saved;
    if stale > 0 {
        warn!(
            "{} frame(s) from an earlier run remain in {}",
            stale,
            request.output_dir.display()
        );
    }

    info!("Extracted {} frames to {}", saved, request.output_dir.display());
    Ok(saved)
}

fn is_frame_file(name: &str) -> bool {
    name.starts_with(FRAME_FILE_PREFIX) && name.ends_with(".jpg")
}

/// Modification time of every frame file in `dir`.
async fn frame_snapshot(dir: &Path) -> PipelineResult<HashMap<String, SystemTime>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut frames = HashMap::new();
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().to_string();
        if is_frame_file(&name) {
            frames.insert(name, entry.metadata().await?.modified()?);
        }
    }
    Ok(frames)
}

/// Number of `frame_*.jpg` files in `dir`.
pub async fn count_frames(dir: &Path) -> PipelineResult<usize> {
    let mut entries = fs::read_dir(dir).await?;
    let mut count = 0;
    while let Some(entry) = entries.next_entry().await? {
        if is_frame_file(&entry.file_name().to_string_lossy()) {
            count += 1;
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use splat_sfm::ExitFailure;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Writes `count` frames into the pattern's directory, like FFmpeg would.
    struct WritesFrames {
        count: usize,
    }

    #[async_trait]
    impl ExternalProcess for WritesFrames {
        async fn run(&self, cmd: &ToolCommand) -> Result<(), ExitFailure> {
            let args = cmd.build_args();
            let pattern = PathBuf::from(args.last().cloned().unwrap_or_default());
            let dir = pattern.parent().map(Path::to_path_buf).unwrap_or_default();
            for i in 0..self.count {
                fs::write(dir.join(format!("frame_{:06}.jpg", i)), b"new")
                    .await
                    .map_err(|e| ExitFailure::new(Some(1), e.to_string()))?;
            }
            Ok(())
        }
    }

    fn write_stale_frames(dir: &Path, count: usize) {
        std::fs::create_dir_all(dir).unwrap();
        let past = SystemTime::now() - Duration::from_secs(3600);
        for i in 0..count {
            let path = dir.join(format!("frame_{:06}.jpg", i));
            std::fs::write(&path, b"old").unwrap();
            std::fs::File::options()
                .write(true)
                .open(&path)
                .unwrap()
                .set_modified(past)
                .unwrap();
        }
    }

    #[test]
    fn test_frame_step() {
        assert_eq!(frame_step(30.0, None), 1);
        assert_eq!(frame_step(30.0, Some(60.0)), 1);
        assert_eq!(frame_step(30.0, Some(30.0)), 1);
        assert_eq!(frame_step(30.0, Some(2.0)), 15);
        assert_eq!(frame_step(29.97, Some(10.0)), 2);
    }

    #[test]
    fn test_jpeg_qscale() {
        assert_eq!(jpeg_qscale(100), 2);
        assert_eq!(jpeg_qscale(0), 31);
        assert_eq!(jpeg_qscale(95), 3);
        assert!(jpeg_qscale(50) > jpeg_qscale(95));
    }

    #[test]
    fn test_command_with_sampling() {
        let request = FrameExtractionRequest::new("/in/video.mp4", "/out/frames")
            .with_fps(Some(2.0))
            .with_max_frames(Some(120));
        let cmd = frame_extraction_command("ffmpeg", &request, 15);
        let args = cmd.build_args();

        assert_eq!(cmd.program(), "ffmpeg");
        assert!(args.contains(&"select=not(mod(n\\,15))".to_string()));
        assert!(args.contains(&"vfr".to_string()));
        let frames_at = args.iter().position(|a| a == "-frames:v").unwrap();
        assert_eq!(args[frames_at + 1], "120");
        assert_eq!(args.last().unwrap(), "/out/frames/frame_%06d.jpg");
    }

    #[test]
    fn test_command_without_sampling() {
        let request = FrameExtractionRequest::new("/in/video.mp4", "/out/frames");
        let args = frame_extraction_command("ffmpeg", &request, 1).build_args();

        assert!(!args.contains(&"-vf".to_string()));
        assert!(!args.contains(&"-frames:v".to_string()));
        let q_at = args.iter().position(|a| a == "-q:v").unwrap();
        assert_eq!(args[q_at + 1], "3");
    }

    #[test]
    fn test_request_validation() {
        let base = FrameExtractionRequest::new("v.mp4", "out");
        assert!(base.clone().with_jpeg_quality(101).validate().is_err());
        assert!(base.clone().with_fps(Some(0.0)).validate().is_err());
        assert!(base.clone().with_max_frames(Some(0)).validate().is_err());
        assert!(base.validate().is_ok());
    }

    #[tokio::test]
    async fn test_count_frames_ignores_other_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("frame_000000.jpg"), b"x").await.unwrap();
        fs::write(dir.path().join("frame_000001.jpg"), b"x").await.unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").await.unwrap();

        assert_eq!(count_frames(dir.path()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_stale_frames_are_not_counted() {
        let dir = TempDir::new().unwrap();
        write_stale_frames(dir.path(), 50);
        let request = FrameExtractionRequest::new("video.mp4", dir.path()).with_max_frames(Some(10));

        let saved = run_extraction(&WritesFrames { count: 0 }, "ffmpeg", &request, 1)
            .await
            .unwrap();
        assert_eq!(saved, 0);

        let saved = run_extraction(&WritesFrames { count: 10 }, "ffmpeg", &request, 1)
            .await
            .unwrap();
        assert_eq!(saved, 10);
        assert_eq!(count_frames(dir.path()).await.unwrap(), 50);
    }

    #[tokio::test]
    async fn test_extraction_into_new_directory() {
        let root = TempDir::new().unwrap();
        let out = root.path().join("frames");
        let request = FrameExtractionRequest::new("video.mp4", &out);

        let saved = run_extraction(&WritesFrames { count: 4 }, "ffmpeg", &request, 1)
            .await
            .unwrap();
        assert_eq!(saved, 4);
    }
}
