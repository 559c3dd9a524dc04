//! Display scaling of single bands to 8-bit images.

use ndarray::Array2;
use serde::Deserialize;

use crate::stats;

pub mod clahe;

/// Below this many valid samples a band is rendered black.
pub const MIN_VALID_SAMPLES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VisualParams {
    pub lower_percentile: f64,
    pub upper_percentile: f64,
    pub apply_clahe: bool,
    pub clahe_clip_limit: f64,
}

impl Default for VisualParams {
    fn default() -> Self {
        Self {
            lower_percentile: 2.0,
            upper_percentile: 98.0,
            apply_clahe: true,
            clahe_clip_limit: 0.02,
        }
    }
}

/// Percentile stretch of `band` to `[0, 1]`, missing samples at 0, optionally equalized.
/// Returns `None` when fewer than [`MIN_VALID_SAMPLES`] samples are valid.
pub fn normalize_unit(band: &Array2<f64>, params: &VisualParams) -> Option<Array2<f64>> {
    let sorted = stats::sorted_valid(band);
    if sorted.len() < MIN_VALID_SAMPLES {
        log::debug!(
            "Only {} valid samples, rendering an empty band",
            sorted.len()
        );
        return None;
    }

    let vmin = stats::percentile(&sorted, params.lower_percentile)?;
    let mut vmax = stats::percentile(&sorted, params.upper_percentile)?;
    if vmax <= vmin {
        vmax = vmin + 1e-9;
    }

    let scaled = band.mapv(|v| {
        if v.is_nan() {
            0.0
        } else {
            (v.clamp(vmin, vmax) - vmin) / (vmax - vmin)
        }
    });

    if params.apply_clahe {
        Some(enhance_or_keep(scaled, params.clahe_clip_limit))
    } else {
        Some(scaled)
    }
}

/// 8-bit display image of `band`; all zero when the band has too few valid samples.
pub fn normalize_visual(band: &Array2<f64>, params: &VisualParams) -> Array2<u8> {
    match normalize_unit(band, params) {
        Some(unit) => unit.mapv(to_byte),
        None => Array2::zeros(band.dim()),
    }
}

fn to_byte(v: f64) -> u8 {
    (v * 255.0) as u8
}

fn enhance_or_keep(scaled: Array2<f64>, clip_limit: f64) -> Array2<f64> {
    match clahe::equalize(&scaled, clip_limit) {
        Ok(equalized) => equalized,
        Err(err) => {
            log::debug!("Contrast enhancement skipped: {}", err);
            scaled
        }
    }
}
