//! SfM tool configuration.

/// Executables and fixed options used for reconstruction.
#[derive(Debug, Clone)]
pub struct SfmToolConfig {
    /// COLMAP executable (extraction, matching, reliable mapper)
    pub colmap_program: String,
    /// GLOMAP executable (fast mapper)
    pub glomap_program: String,
    /// Share one set of intrinsics across all frames (frames come from one video)
    pub single_camera: bool,
}

impl Default for SfmToolConfig {
    fn default() -> Self {
        Self {
            colmap_program: "colmap".to_string(),
            glomap_program: "glomap".to_string(),
            single_camera: true,
        }
    }
}

impl SfmToolConfig {
    pub fn with_colmap(mut self, program: impl Into<String>) -> Self {
        self.colmap_program = program.into();
        self
    }

    pub fn with_glomap(mut self, program: impl Into<String>) -> Self {
        self.glomap_program = program.into();
        self
    }
}
