//! Quality tier definitions for SfM feature extraction.
//!
//! A quality tier is a coarse preset trading reconstruction fidelity for
//! compute cost:
//!
//! - `High`: images capped at 4096 px, 8k features per image
//! - `Medium`: images capped at 2048 px, 4k features
//! - `Low`: images capped at 1024 px, 2k features

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Quality tier for feature extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    /// Largest images and feature budget. Slowest.
    #[default]
    High,

    /// Balanced preset.
    Medium,

    /// Smallest images and feature budget. Fastest.
    Low,
}

/// Concrete SIFT extraction limits derived from a [`QualityTier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityParameters {
    /// Longest image side passed to the extractor, in pixels
    pub max_image_size: u32,
    /// Maximum number of features kept per image
    pub max_num_features: u32,
}

impl QualityTier {
    /// All available quality tiers.
    pub const ALL: &'static [QualityTier] = &[QualityTier::High, QualityTier::Medium, QualityTier::Low];

    /// Returns the tier name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::High => "high",
            QualityTier::Medium => "medium",
            QualityTier::Low => "low",
        }
    }

    /// Returns the fixed extraction parameters for this tier.
    pub fn parameters(&self) -> QualityParameters {
        match self {
            QualityTier::High => QualityParameters {
                max_image_size: 4096,
                max_num_features: 8192,
            },
            QualityTier::Medium => QualityParameters {
                max_image_size: 2048,
                max_num_features: 4096,
            },
            QualityTier::Low => QualityParameters {
                max_image_size: 1024,
                max_num_features: 2048,
            },
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for QualityTier {
    type Err = QualityTierParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(QualityTier::High),
            "medium" => Ok(QualityTier::Medium),
            "low" => Ok(QualityTier::Low),
            _ => Err(QualityTierParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Unknown quality tier: {0}")]
pub struct QualityTierParseError(pub String);
