//! In-process stand-ins for the external tools.
//!
//! [`RecordingProcess`] records every command instead of spawning it and
//! answers with a scripted outcome per invocation (`"colmap mapper"`, ...).
//! [`FixedAvailability`] reports a fixed set of installed programs.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tokio::fs;

use crate::availability::ToolAvailability;
use crate::command::{ExitFailure, ExternalProcess, ToolCommand};

/// What a stubbed invocation does.
#[derive(Debug, Clone)]
pub enum StubOutcome {
    /// Exit 0 without touching the filesystem.
    Succeed,
    /// Exit with the given nonzero code.
    Fail { exit_code: i32 },
    /// Exit 0 after creating `<output_path>/<id>/cameras.txt` for each id.
    CreateModels(Vec<String>),
}

/// Records commands and replies with scripted outcomes. Unscripted
/// invocations succeed.
#[derive(Debug, Default)]
pub struct RecordingProcess {
    calls: Mutex<Vec<ToolCommand>>,
    outcomes: HashMap<String, StubOutcome>,
}

impl RecordingProcess {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the outcome for `invocation` (`program subcommand`).
    pub fn on(mut self, invocation: &str, outcome: StubOutcome) -> Self {
        self.outcomes.insert(invocation.to_string(), outcome);
        self
    }

    /// Every command run so far, in order.
    pub fn calls(&self) -> Vec<ToolCommand> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `program subcommand` of every command run so far, in order.
    pub fn invocations(&self) -> Vec<String> {
        self.calls().iter().map(ToolCommand::invocation).collect()
    }

    /// Number of times `invocation` ran.
    pub fn count(&self, invocation: &str) -> usize {
        self.invocations().iter().filter(|i| *i == invocation).count()
    }
}

#[async_trait]
impl ExternalProcess for RecordingProcess {
    async fn run(&self, cmd: &ToolCommand) -> Result<(), ExitFailure> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(cmd.clone());

        match self.outcomes.get(&cmd.invocation()) {
            None | Some(StubOutcome::Succeed) => Ok(()),
            Some(StubOutcome::Fail { exit_code }) => Err(ExitFailure::new(
                Some(*exit_code),
                format!("{} exited with exit status: {}", cmd.program(), exit_code),
            )),
            Some(StubOutcome::CreateModels(ids)) => {
                let output = cmd.option_value("output_path").map(PathBuf::from).ok_or_else(|| {
                    ExitFailure::new(Some(2), format!("{}: missing --output_path", cmd.invocation()))
                })?;
                for id in ids {
                    let model_dir = output.join(id);
                    fs::create_dir_all(&model_dir)
                        .await
                        .map_err(|e| ExitFailure::new(Some(1), e.to_string()))?;
                    fs::write(model_dir.join("cameras.txt"), b"# stub camera list\n")
                        .await
                        .map_err(|e| ExitFailure::new(Some(1), e.to_string()))?;
                }
                Ok(())
            }
        }
    }
}

/// Availability answered from a fixed set of program names.
#[derive(Debug, Clone, Default)]
pub struct FixedAvailability {
    installed: HashSet<String>,
}

impl FixedAvailability {
    /// Nothing is installed.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with(mut self, program: &str) -> Self {
        self.installed.insert(program.to_string());
        self
    }
}

impl ToolAvailability for FixedAvailability {
    fn is_available(&self, program: &str) -> bool {
        self.installed.contains(program)
    }
}
