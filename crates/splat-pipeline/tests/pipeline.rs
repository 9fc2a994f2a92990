//! Pipeline runs against recorded tools.

use std::path::Path;

use splat_models::MappingBackendKind;
use splat_pipeline::{run_pipeline, train, PipelineConfig, PipelineError, PipelineRunRequest, TrainingRequest};
use splat_sfm::testing::{FixedAvailability, RecordingProcess, StubOutcome};
use splat_sfm::SfmError;
use tempfile::TempDir;

fn write_frames(dir: &Path, count: usize) {
    std::fs::create_dir_all(dir).unwrap();
    for i in 0..count {
        std::fs::write(dir.join(format!("frame_{:06}.jpg", i)), b"jpeg").unwrap();
    }
}

fn test_config() -> PipelineConfig {
    PipelineConfig {
        python_program: "python3".to_string(),
        train_script: "/gs/train.py".into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_pipeline_from_existing_frames() {
    let project = TempDir::new().unwrap();
    write_frames(&project.path().join("images"), 6);

    let process = RecordingProcess::new()
        .on("colmap mapper", StubOutcome::CreateModels(vec!["0".to_string()]));
    let request = PipelineRunRequest::new(None, project.path());

    let summary = run_pipeline(process, FixedAvailability::none(), &test_config(), &request)
        .await
        .unwrap();

    assert_eq!(summary.frame_count, 6);
    assert_eq!(summary.reconstruction.backend, MappingBackendKind::Reliable);
    assert_eq!(summary.reconstruction.primary, project.path().join("sparse").join("0"));
    assert_eq!(summary.model_dir, project.path().join("model"));
    assert!(summary.exported_ply.is_none());
    assert!(summary.model_dir.is_dir());
}

#[tokio::test]
async fn test_pipeline_exports_latest_ply() {
    let project = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_frames(&project.path().join("images"), 3);

    // Stands in for what the trainer leaves behind.
    let iteration = project.path().join("model/point_cloud/iteration_30000");
    std::fs::create_dir_all(&iteration).unwrap();
    std::fs::write(iteration.join("point_cloud.ply"), b"ply").unwrap();

    let process = RecordingProcess::new()
        .on("glomap mapper", StubOutcome::CreateModels(vec!["0".to_string()]));
    let mut request = PipelineRunRequest::new(None, project.path());
    request.export_path = Some(out.path().join("scene.ply"));

    let summary = run_pipeline(
        process,
        FixedAvailability::none().with("glomap"),
        &test_config(),
        &request,
    )
    .await
    .unwrap();

    assert_eq!(summary.reconstruction.backend, MappingBackendKind::Fast);
    assert_eq!(summary.exported_ply, Some(out.path().join("scene.ply")));
    assert_eq!(std::fs::read(out.path().join("scene.ply")).unwrap(), b"ply");
}

#[tokio::test]
async fn test_pipeline_stops_when_reconstruction_fails() {
    let project = TempDir::new().unwrap();
    write_frames(&project.path().join("images"), 3);

    let process = RecordingProcess::new().on("colmap exhaustive_matcher", StubOutcome::Fail { exit_code: 1 });
    let request = PipelineRunRequest::new(None, project.path());

    let err = run_pipeline(process, FixedAvailability::none(), &test_config(), &request)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Sfm(_)));
    assert!(!project.path().join("model").exists());
}

#[tokio::test]
async fn test_pipeline_without_frames() {
    let project = TempDir::new().unwrap();
    let process = RecordingProcess::new();
    let request = PipelineRunRequest::new(None, project.path());

    let err = run_pipeline(&process, FixedAvailability::none(), &test_config(), &request)
        .await
        .unwrap_err();

    match err {
        PipelineError::Sfm(SfmError::InputNotFound(dir)) => {
            assert_eq!(dir, project.path().join("images"))
        }
        other => panic!("expected InputNotFound, got {:?}", other),
    }
    assert!(process.calls().is_empty());
}

#[tokio::test]
async fn test_train_invokes_trainer_once() {
    let project = TempDir::new().unwrap();
    let model = project.path().join("model");
    let process = RecordingProcess::new();

    train(&process, &test_config(), &TrainingRequest::new(project.path(), &model))
        .await
        .unwrap();

    let calls = process.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].program(), "python3");
    assert_eq!(calls[0].build_args()[0], "/gs/train.py");
    assert!(model.is_dir());
}

#[tokio::test]
async fn test_train_failure_keeps_exit_code() {
    let project = TempDir::new().unwrap();
    let process = RecordingProcess::new().on("python3", StubOutcome::Fail { exit_code: 137 });

    let err = train(
        &process,
        &test_config(),
        &TrainingRequest::new(project.path(), project.path().join("model")),
    )
    .await
    .unwrap_err();

    match err {
        PipelineError::TrainingFailed(failure) => assert_eq!(failure.exit_code, Some(137)),
        other => panic!("expected TrainingFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_train_missing_source() {
    let project = TempDir::new().unwrap();
    let process = RecordingProcess::new();

    let err = train(
        &process,
        &test_config(),
        &TrainingRequest::new(project.path().join("missing"), project.path().join("model")),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, PipelineError::FileNotFound(_)));
    assert_eq!(process.calls().len(), 0);
}
