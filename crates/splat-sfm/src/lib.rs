//! Structure-from-Motion orchestration over the COLMAP/GLOMAP CLIs.
//!
//! This crate provides:
//! - Type-safe command building for the external SfM tools
//! - An injectable process runner and tool-availability probe
//! - Quality tier resolution
//! - Mapping backend selection with fallback from GLOMAP to COLMAP
//! - The artifact layout contract consumed by training
//! - The reconstruction orchestrator, plus recording stubs for tests behind
//!   the `testing` feature

pub mod adapter;
pub mod availability;
pub mod backend;
pub mod command;
pub mod config;
pub mod error;
pub mod layout;
pub mod logging;
pub mod orchestrator;
pub mod quality;
pub mod request;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use availability::{PathLookup, ToolAvailability};
pub use backend::{select_backend, BackendSelection, MappingBackend};
pub use command::{ExitFailure, ExternalProcess, TokioProcess, ToolCommand};
pub use config::SfmToolConfig;
pub use error::{SfmError, SfmResult};
pub use layout::ArtifactLayout;
pub use logging::RunLogger;
pub use orchestrator::Reconstructor;
pub use quality::resolve_quality;
pub use request::{ReconstructionRequest, ReconstructionResult, ReconstructionWarning};
