//! Environment self-check for the external tools.

use std::process::Stdio;
use std::time::Duration;

use serde::Serialize;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};

/// Result of probing one executable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolCheck {
    /// Display name (`COLMAP`, `FFmpeg`, ...)
    pub name: String,
    pub program: String,
    /// A missing required tool fails the check
    pub required: bool,
    pub available: bool,
    /// Reason when unavailable
    pub detail: Option<String>,
}

/// Outcome of [`check_environment`].
#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentReport {
    pub checks: Vec<ToolCheck>,
    /// GPU name reported by `nvidia-smi`
    pub gpu: Option<String>,
}

impl EnvironmentReport {
    /// Programs that are required but unavailable.
    pub fn missing_required(&self) -> Vec<String> {
        self.checks
            .iter()
            .filter(|c| c.required && !c.available)
            .map(|c| c.program.clone())
            .collect()
    }

    pub fn is_ok(&self) -> bool {
        self.missing_required().is_empty()
    }

    /// Fail with [`PipelineError::MissingTools`] unless every required tool is present.
    pub fn ensure_ok(&self) -> PipelineResult<()> {
        let missing = self.missing_required();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::MissingTools(missing))
        }
    }
}

/// Probe every external tool the pipeline uses.
pub async fn check_environment(config: &PipelineConfig) -> EnvironmentReport {
    let probes: [(&str, &str, &str, bool); 5] = [
        ("COLMAP", config.colmap_program.as_str(), "help", true),
        ("GLOMAP", config.glomap_program.as_str(), "--help", false),
        ("FFmpeg", config.ffmpeg_program.as_str(), "-version", true),
        ("FFprobe", config.ffprobe_program.as_str(), "-version", true),
        ("Python", config.python_program.as_str(), "--version", false),
    ];

    let mut checks = Vec::with_capacity(probes.len());
    for (name, program, arg, required) in probes {
        let check = match probe_tool(program, arg, config.probe_timeout).await {
            Ok(()) => {
                info!("{}: found ({})", name, program);
                ToolCheck {
                    name: name.to_string(),
                    program: program.to_string(),
                    required,
                    available: true,
                    detail: None,
                }
            }
            Err(detail) => {
                warn!("{}: not available ({})", name, detail);
                ToolCheck {
                    name: name.to_string(),
                    program: program.to_string(),
                    required,
                    available: false,
                    detail: Some(detail),
                }
            }
        };
        checks.push(check);
    }

    let gpu = detect_gpu(config.probe_timeout).await;
    match &gpu {
        Some(name) => info!("GPU: {}", name),
        None => warn!("No CUDA GPU detected, reconstruction will be slow"),
    }

    EnvironmentReport { checks, gpu }
}

/// A tool counts as present when it runs to completion within `limit`,
/// whatever its exit code (`colmap help` exits nonzero on some builds).
async fn probe_tool(program: &str, arg: &str, limit: Duration) -> Result<(), String> {
    let mut cmd = Command::new(program);
    cmd.arg(arg)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    match timeout(limit, cmd.status()).await {
        Ok(Ok(_status)) => Ok(()),
        Ok(Err(e)) => Err(format!("failed to start {}: {}", program, e)),
        Err(_) => Err(format!("{} did not respond within {:?}", program, limit)),
    }
}

async fn detect_gpu(limit: Duration) -> Option<String> {
    let mut cmd = Command::new("nvidia-smi");
    cmd.args(["--query-gpu=name", "--format=csv,noheader"])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    let output = timeout(limit, cmd.output()).await.ok()?.ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(program: &str, required: bool, available: bool) -> ToolCheck {
        ToolCheck {
            name: program.to_uppercase(),
            program: program.to_string(),
            required,
            available,
            detail: None,
        }
    }

    #[test]
    fn test_optional_tools_do_not_fail_report() {
        let report = EnvironmentReport {
            checks: vec![check("colmap", true, true), check("glomap", false, false)],
            gpu: None,
        };
        assert!(report.is_ok());
        assert!(report.ensure_ok().is_ok());
    }

    #[test]
    fn test_missing_required_tools() {
        let report = EnvironmentReport {
            checks: vec![
                check("colmap", true, false),
                check("ffmpeg", true, true),
                check("ffprobe", true, false),
            ],
            gpu: Some("RTX 4090".to_string()),
        };
        assert_eq!(report.missing_required(), vec!["colmap", "ffprobe"]);
        match report.ensure_ok() {
            Err(PipelineError::MissingTools(tools)) => assert_eq!(tools.len(), 2),
            other => panic!("expected MissingTools, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_probe_missing_program() {
        let result = probe_tool("definitely-not-a-real-sfm-binary", "--help", Duration::from_secs(1)).await;
        assert!(result.unwrap_err().contains("failed to start"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_probe_nonzero_exit_counts_as_present() {
        assert!(probe_tool("false", "--help", Duration::from_secs(5)).await.is_ok());
    }

    #[tokio::test]
    async fn test_check_environment_reports_every_tool() {
        let config = PipelineConfig {
            colmap_program: "definitely-not-colmap".to_string(),
            glomap_program: "definitely-not-glomap".to_string(),
            ffmpeg_program: "definitely-not-ffmpeg".to_string(),
            ffprobe_program: "definitely-not-ffprobe".to_string(),
            python_program: "definitely-not-python".to_string(),
            probe_timeout: Duration::from_secs(1),
            ..Default::default()
        };
        let report = check_environment(&config).await;

        assert_eq!(report.checks.len(), 5);
        assert_eq!(
            report.missing_required(),
            vec!["definitely-not-colmap", "definitely-not-ffmpeg", "definitely-not-ffprobe"]
        );
        assert!(!report.is_ok());
    }
}
