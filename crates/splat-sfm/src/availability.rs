//! Tool presence probing.

use tracing::debug;

/// Answers whether an executable can be launched.
#[cfg_attr(test, mockall::automock)]
pub trait ToolAvailability: Send + Sync {
    fn is_available(&self, program: &str) -> bool;
}

/// Looks executables up on `PATH`.
#[derive(Debug, Clone, Default)]
pub struct PathLookup;

impl ToolAvailability for PathLookup {
    fn is_available(&self, program: &str) -> bool {
        match which::which(program) {
            Ok(path) => {
                debug!("Found {} at {}", program, path.display());
                true
            }
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_lookup_missing() {
        assert!(!PathLookup.is_available("definitely-not-a-real-sfm-binary"));
    }

    #[cfg(unix)]
    #[test]
    fn test_path_lookup_present() {
        assert!(PathLookup.is_available("sh"));
    }
}
