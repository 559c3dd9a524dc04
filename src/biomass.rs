use serde::Deserialize;

use crate::error::{PipelineError, Result};
use crate::index::VegetationIndexResult;
use crate::stats;

const DEFAULT_SLOPE: f64 = 13147.5532;
const DEFAULT_INTERCEPT: f64 = -557.5606;

/// Calibrated linear regression from an NDVI statistic to a biomass proxy.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BiomassModel {
    pub slope: f64,
    pub intercept: f64,
}

impl Default for BiomassModel {
    fn default() -> Self {
        Self {
            slope: DEFAULT_SLOPE,
            intercept: DEFAULT_INTERCEPT,
        }
    }
}

impl BiomassModel {
    /// Biomass for one NDVI statistic, floored at zero.
    pub fn estimate(&self, ndvi: f64) -> f64 {
        (self.slope * ndvi + self.intercept).max(0.0)
    }
}

/// Result of [`estimate_for_index`]: the statistic used and the biomass it maps to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiomassEstimate {
    pub ndvi_statistic: f64,
    pub biomass: f64,
}

/// Biomass from the `percentile`-th percentile of the valid NDVI samples.
pub fn estimate_for_index(
    result: &VegetationIndexResult,
    model: &BiomassModel,
    percentile: f64,
) -> Result<BiomassEstimate> {
    let sorted = stats::sorted_valid(&result.ndvi);
    let Some(ndvi_statistic) = stats::percentile(&sorted, percentile) else {
        return Err(PipelineError::InsufficientData {
            required: 1,
            found: 0,
        });
    };

    let biomass = model.estimate(ndvi_statistic);
    log::debug!(
        "NDVI p{} = {:.6} over {} samples -> biomass {:.4}",
        percentile,
        ndvi_statistic,
        sorted.len(),
        biomass
    );

    Ok(BiomassEstimate {
        ndvi_statistic,
        biomass,
    })
}
