//! Mapping backend identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which sparse mapper produced a reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingBackendKind {
    /// Global mapper (GLOMAP). Much faster on large image sets.
    Fast,
    /// Incremental COLMAP mapper. Slower, always available with COLMAP.
    Reliable,
}

impl MappingBackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MappingBackendKind::Fast => "fast",
            MappingBackendKind::Reliable => "reliable",
        }
    }
}

impl fmt::Display for MappingBackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
