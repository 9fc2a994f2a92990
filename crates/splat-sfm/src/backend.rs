//! Mapping backends and the selection policy between them.
//!
//! Selection happens once, before any external process runs:
//!
//! - fast backend disabled by the caller: reliable
//! - fast executable found on the search path: fast
//! - otherwise: reliable, with a [`ReconstructionWarning::BackendUnavailable`]
//!
//! A fast backend that fails while running is not retried with the reliable one.

use std::path::Path;

use splat_models::MappingBackendKind;

use crate::availability::ToolAvailability;
use crate::command::ToolCommand;
use crate::config::SfmToolConfig;
use crate::layout::ArtifactLayout;
use crate::request::ReconstructionWarning;

/// A sparse mapper implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingBackend {
    /// `glomap mapper`
    Fast { program: String },
    /// `colmap mapper`
    Reliable { program: String },
}

impl MappingBackend {
    pub fn kind(&self) -> MappingBackendKind {
        match self {
            MappingBackend::Fast { .. } => MappingBackendKind::Fast,
            MappingBackend::Reliable { .. } => MappingBackendKind::Reliable,
        }
    }

    pub fn program(&self) -> &str {
        match self {
            MappingBackend::Fast { program } | MappingBackend::Reliable { program } => program,
        }
    }

    /// Both mappers take the same arguments and write numbered models into
    /// the output path.
    pub fn mapper_command(&self, layout: &ArtifactLayout, image_dir: &Path) -> ToolCommand {
        ToolCommand::new(self.program())
            .subcommand("mapper")
            .path_option("database_path", &layout.database_path())
            .path_option("image_path", image_dir)
            .path_option("output_path", &layout.sparse_dir())
    }
}

/// Outcome of backend selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendSelection {
    pub backend: MappingBackend,
    /// Set when the fast backend was wanted but missing
    pub warning: Option<ReconstructionWarning>,
}

/// Pick the mapping backend for a run.
pub fn select_backend<A>(prefer_fast: bool, tools: &SfmToolConfig, availability: &A) -> BackendSelection
where
    A: ToolAvailability + ?Sized,
{
    let reliable = MappingBackend::Reliable {
        program: tools.colmap_program.clone(),
    };

    if !prefer_fast {
        return BackendSelection {
            backend: reliable,
            warning: None,
        };
    }

    if availability.is_available(&tools.glomap_program) {
        return BackendSelection {
            backend: MappingBackend::Fast {
                program: tools.glomap_program.clone(),
            },
            warning: None,
        };
    }

    BackendSelection {
        backend: reliable,
        warning: Some(ReconstructionWarning::BackendUnavailable {
            program: tools.glomap_program.clone(),
        }),
    }
}
