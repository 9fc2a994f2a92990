//! External tool command builder and runner.

use std::collections::VecDeque;
use std::fmt;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::debug;

/// Number of trailing stderr lines kept for failure messages.
const STDERR_TAIL_LINES: usize = 20;

/// Builder for an invocation of a subcommand-style CLI (`colmap mapper ...`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    /// Executable name or path
    program: String,
    /// Subcommand placed before all other arguments
    subcommand: Option<String>,
    /// Remaining arguments in order
    args: Vec<String>,
}

impl ToolCommand {
    /// Create a new command for `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            subcommand: None,
            args: Vec::new(),
        }
    }

    /// Set the subcommand.
    pub fn subcommand(mut self, name: impl Into<String>) -> Self {
        self.subcommand = Some(name.into());
        self
    }

    /// Add a single raw argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple raw arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add a `--name value` pair.
    pub fn option(self, name: &str, value: impl ToString) -> Self {
        self.arg(format!("--{}", name)).arg(value.to_string())
    }

    /// Add a `--name <path>` pair.
    pub fn path_option(self, name: &str, path: &Path) -> Self {
        self.arg(format!("--{}", name))
            .arg(path.to_string_lossy().to_string())
    }

    /// Add a `--name value` pair only when `enabled` is set.
    pub fn option_if(self, enabled: bool, name: &str, value: impl ToString) -> Self {
        if enabled {
            self.option(name, value)
        } else {
            self
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_subcommand(&self) -> Option<&str> {
        self.subcommand.as_deref()
    }

    /// `program subcommand`, used to identify an invocation in logs and stubs.
    pub fn invocation(&self) -> String {
        match &self.subcommand {
            Some(sub) => format!("{} {}", self.program, sub),
            None => self.program.clone(),
        }
    }

    /// Value following `--name`, if present.
    pub fn option_value(&self, name: &str) -> Option<&str> {
        let flag = format!("--{}", name);
        self.args
            .iter()
            .position(|a| *a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    /// Build the argument list (everything after the program).
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.args.len() + 1);
        if let Some(sub) = &self.subcommand {
            args.push(sub.clone());
        }
        args.extend(self.args.iter().cloned());
        args
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in self.build_args() {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// A process that did not exit successfully.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ExitFailure {
    /// Exit code, `None` when killed by a signal or never started
    pub exit_code: Option<i32>,
    pub message: String,
}

impl ExitFailure {
    pub fn new(exit_code: Option<i32>, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }
}

/// Runs an external command to completion.
#[async_trait]
pub trait ExternalProcess: Send + Sync {
    /// Run `cmd`, returning once the process has exited.
    async fn run(&self, cmd: &ToolCommand) -> Result<(), ExitFailure>;
}

#[async_trait]
impl<'a, T> ExternalProcess for &'a T
where
    T: ExternalProcess + ?Sized,
{
    async fn run(&self, cmd: &ToolCommand) -> Result<(), ExitFailure> {
        (**self).run(cmd).await
    }
}

/// Runs commands as real child processes.
///
/// Stdout is inherited so tool progress stays visible. Stderr is forwarded to
/// `debug!` and its tail is attached to failures.
#[derive(Debug, Clone, Default)]
pub struct TokioProcess;

impl TokioProcess {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ExternalProcess for TokioProcess {
    async fn run(&self, cmd: &ToolCommand) -> Result<(), ExitFailure> {
        let args = cmd.build_args();
        debug!("Running: {}", cmd);

        let mut child = Command::new(cmd.program())
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ExitFailure::new(None, format!("failed to start {}: {}", cmd.program(), e))
            })?;

        let stderr = child.stderr.take();
        let program = cmd.program().to_string();

        let tail_handle = tokio::spawn(async move {
            let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
            let Some(stderr) = stderr else {
                return tail;
            };

            // Tools print raw file paths, so lines are decoded lossily and the
            // pipe is drained until EOF even when a line is not UTF-8.
            let mut reader = BufReader::new(stderr);
            let mut buf = Vec::new();
            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {}
                }
                let line = String::from_utf8_lossy(&buf).trim_end_matches(['\r', '\n']).to_string();
                debug!(target: "splat_sfm::tool", program = %program, "{}", line);
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
            tail
        });

        let status = child.wait().await.map_err(|e| {
            ExitFailure::new(None, format!("failed to wait for {}: {}", cmd.program(), e))
        })?;

        let tail = tail_handle.await.unwrap_or_default();

        if status.success() {
            return Ok(());
        }

        let mut message = format!("{} exited with {}", cmd.program(), status);
        if !tail.is_empty() {
            message.push('\n');
            message.push_str(&Vec::from(tail).join("\n"));
        }
        Err(ExitFailure::new(status.code(), message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder() {
        let cmd = ToolCommand::new("colmap")
            .subcommand("feature_extractor")
            .path_option("database_path", Path::new("/out/database.db"))
            .option("SiftExtraction.max_image_size", 2048)
            .option_if(false, "SiftExtraction.use_gpu", 1);

        assert_eq!(
            cmd.build_args(),
            vec![
                "feature_extractor",
                "--database_path",
                "/out/database.db",
                "--SiftExtraction.max_image_size",
                "2048",
            ]
        );
        assert_eq!(cmd.invocation(), "colmap feature_extractor");
        assert_eq!(cmd.option_value("database_path"), Some("/out/database.db"));
        assert_eq!(cmd.option_value("SiftExtraction.use_gpu"), None);
    }

    #[test]
    fn test_command_display() {
        let cmd = ToolCommand::new("glomap")
            .subcommand("mapper")
            .option("output_path", "sparse");
        assert_eq!(cmd.to_string(), "glomap mapper --output_path sparse");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_tokio_process_reports_exit_code() {
        let ok = ToolCommand::new("sh").args(["-c", "exit 0"]);
        assert!(TokioProcess::new().run(&ok).await.is_ok());

        let failing = ToolCommand::new("sh").args(["-c", "echo boom >&2; exit 3"]);
        let err = TokioProcess::new().run(&failing).await.unwrap_err();
        assert_eq!(err.exit_code, Some(3));
        assert!(err.message.contains("boom"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_tokio_process_tolerates_non_utf8_stderr() {
        let script = "printf '\\377\\376 bad path\\n' >&2; sleep 0.2; \
                      i=0; while [ $i -lt 2000 ]; do echo \"line $i\" >&2; i=$((i+1)); done; exit 0";
        let cmd = ToolCommand::new("sh").args(["-c", script]);
        assert!(TokioProcess::new().run(&cmd).await.is_ok());

        let failing = ToolCommand::new("sh").args(["-c", "printf '\\377 path\\nlast words\\n' >&2; exit 4"]);
        let err = TokioProcess::new().run(&failing).await.unwrap_err();
        assert_eq!(err.exit_code, Some(4));
        assert!(err.message.contains("last words"));
        assert!(err.message.contains('\u{FFFD}'));
    }

    #[tokio::test]
    async fn test_tokio_process_missing_program() {
        let cmd = ToolCommand::new("definitely-not-a-real-sfm-binary");
        let err = TokioProcess::new().run(&cmd).await.unwrap_err();
        assert_eq!(err.exit_code, None);
        assert!(err.message.contains("failed to start"));
    }
}
