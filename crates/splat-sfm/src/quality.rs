//! Quality tier resolution.

use splat_models::{QualityParameters, QualityTier};

use crate::error::SfmResult;

/// Resolve a tier name (`high`, `medium`, `low`) to its extraction parameters.
pub fn resolve_quality(tier: &str) -> SfmResult<QualityParameters> {
    let tier: QualityTier = tier.parse()?;
    Ok(tier.parameters())
}
