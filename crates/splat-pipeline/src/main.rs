//! Video to Gaussian Splat pipeline CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use splat_models::{CameraModel, QualityTier};
use splat_pipeline::{
    check_environment, export_ply, extract_frames, run_pipeline, train, FrameExtractionRequest,
    PipelineConfig, PipelineRunRequest, TrainingRequest,
};
use splat_sfm::{PathLookup, ReconstructionRequest, Reconstructor, TokioProcess};

#[derive(Parser)]
#[command(name = "splat-pipeline")]
#[command(about = "Turn a video into a Gaussian Splatting model via COLMAP/GLOMAP")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract frames from a video.
    Frames(FramesArgs),

    /// Run Structure-from-Motion on a directory of frames.
    Reconstruct(ReconstructArgs),

    /// Train a Gaussian Splatting model from a reconstruction.
    Train(TrainArgs),

    /// Copy the trained point cloud out as a PLY file.
    Export(ExportArgs),

    /// Check that the external tools are installed.
    Check,

    /// Run frames, reconstruction, training and optional export in one go.
    Run(RunArgs),
}

#[derive(Debug, Clone, Args)]
struct FramesArgs {
    /// Input video file.
    #[arg(long)]
    video: PathBuf,

    /// Output directory (default: <data>/processed/frames).
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Target frames per second; all frames when omitted.
    #[arg(long)]
    fps: Option<f64>,

    /// Maximum number of frames to extract.
    #[arg(long)]
    max_frames: Option<u32>,

    /// JPEG quality (0-100).
    #[arg(long, default_value_t = 95)]
    jpeg_quality: u8,
}

#[derive(Debug, Clone, Args)]
struct ReconstructArgs {
    /// Directory of input frames (default: <data>/processed/frames).
    #[arg(long)]
    images_dir: Option<PathBuf>,

    /// Reconstruction output directory (default: <data>/processed/colmap).
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// COLMAP camera model.
    #[arg(long, default_value = "OPENCV")]
    camera_model: CameraModel,

    /// Quality tier: high, medium or low.
    #[arg(long, default_value = "high")]
    quality: QualityTier,

    /// Run SIFT on the CPU.
    #[arg(long)]
    no_gpu: bool,

    /// Always use the COLMAP mapper.
    #[arg(long)]
    no_glomap: bool,

    /// Print the result as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Args)]
struct TrainArgs {
    /// Reconstruction root containing `images/` and `sparse/` (default: <data>/processed/colmap).
    #[arg(long)]
    source: Option<PathBuf>,

    /// Model output directory (default: <data>/output/splats/model).
    #[arg(long)]
    model: Option<PathBuf>,

    #[arg(long, default_value_t = 30_000)]
    iterations: u32,

    /// Resolution downscale factor.
    #[arg(long, default_value_t = 1)]
    resolution: u32,
}

#[derive(Debug, Clone, Args)]
struct ExportArgs {
    /// Trained model directory (default: <data>/output/splats/model).
    #[arg(long)]
    model: Option<PathBuf>,

    /// Output PLY path (default: <model>/point_cloud.ply).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Iteration to export; the latest when omitted.
    #[arg(long)]
    iteration: Option<u32>,
}

#[derive(Debug, Clone, Args)]
struct RunArgs {
    /// Input video; reuses `<project>/images` when omitted.
    #[arg(long)]
    video: Option<PathBuf>,

    /// Project directory.
    #[arg(long)]
    project_dir: PathBuf,

    #[arg(long)]
    fps: Option<f64>,

    #[arg(long)]
    max_frames: Option<u32>,

    #[arg(long, default_value = "OPENCV")]
    camera_model: CameraModel,

    #[arg(long, default_value = "high")]
    quality: QualityTier,

    #[arg(long)]
    no_gpu: bool,

    #[arg(long)]
    no_glomap: bool,

    #[arg(long, default_value_t = 30_000)]
    iterations: u32,

    /// Export the final PLY to this path.
    #[arg(long)]
    export: Option<PathBuf>,

    /// Print the summary as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = PipelineConfig::from_env();

    if let Err(e) = run(cli.command, config).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

/// Colored output for dev, JSON when `LOG_FORMAT=json`.
fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("splat=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(false),
            )
            .with(env_filter)
            .init();
    }
}

async fn run(command: Commands, config: PipelineConfig) -> anyhow::Result<()> {
    match command {
        Commands::Frames(args) => {
            let output_dir = args.output_dir.unwrap_or_else(|| config.frames_dir());
            let request = FrameExtractionRequest::new(&args.video, &output_dir)
                .with_fps(args.fps)
                .with_max_frames(args.max_frames)
                .with_jpeg_quality(args.jpeg_quality);
            let count = extract_frames(&TokioProcess::new(), &config, &request).await?;
            info!("{} frames in {}", count, output_dir.display());
        }
        Commands::Reconstruct(args) => {
            let request = ReconstructionRequest::new(
                args.images_dir.unwrap_or_else(|| config.frames_dir()),
                args.output_dir.unwrap_or_else(|| config.colmap_dir()),
            )
            .with_camera_model(args.camera_model)
            .with_quality(args.quality)
            .with_gpu(!args.no_gpu)
            .with_fast_backend(!args.no_glomap);

            let reconstructor = Reconstructor::new(TokioProcess::new(), PathLookup, config.sfm_tools());
            let result = reconstructor.reconstruct(&request).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                info!("Sparse model: {}", result.primary.display());
            }
        }
        Commands::Train(args) => {
            let request = TrainingRequest::new(
                args.source.unwrap_or_else(|| config.colmap_dir()),
                args.model.unwrap_or_else(|| config.model_dir()),
            )
            .with_iterations(args.iterations)
            .with_resolution(args.resolution);
            train(&TokioProcess::new(), &config, &request).await?;
        }
        Commands::Export(args) => {
            let model = args.model.unwrap_or_else(|| config.model_dir());
            let path = export_ply(&model, args.output.as_deref(), args.iteration).await?;
            println!("{}", path.display());
        }
        Commands::Check => {
            let report = check_environment(&config).await;
            for check in &report.checks {
                let status = if check.available { "ok" } else { "missing" };
                println!("{:<8} {:<8} {}", check.name, status, check.program);
            }
            match &report.gpu {
                Some(gpu) => println!("{:<8} {:<8} {}", "GPU", "ok", gpu),
                None => println!("{:<8} {:<8}", "GPU", "missing"),
            }
            if !report.is_ok() {
                warn!("Required tools are missing");
            }
            report.ensure_ok()?;
        }
        Commands::Run(args) => {
            let mut request = PipelineRunRequest::new(args.video, &args.project_dir);
            request.target_fps = args.fps;
            request.max_frames = args.max_frames;
            request.camera_model = args.camera_model;
            request.quality = args.quality;
            request.use_gpu = !args.no_gpu;
            request.prefer_fast_backend = !args.no_glomap;
            request.iterations = args.iterations;
            request.export_path = args.export;

            let summary = run_pipeline(TokioProcess::new(), PathLookup, &config, &request).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                info!("Model: {}", summary.model_dir.display());
                if let Some(ply) = &summary.exported_ply {
                    info!("PLY: {}", ply.display());
                }
            }
        }
    }
    Ok(())
}
