//! Estimated near-infrared and NDVI from the visible bands.

use ndarray::{Array2, Zip};
use serde::Deserialize;

use crate::clip::ClippedBands;
use crate::extent::Extent;
use crate::readers::GeoTransform;

const DEFAULT_A: f64 = 360.6;
const DEFAULT_B: f64 = 1.1941;
const DEFAULT_EPSILON: f64 = 1e-9;

/// Linear relation between Green reflectance and near-infrared: `nir = (a - green) / b`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NirModel {
    pub a: f64,
    pub b: f64,
    /// Added to the NDVI denominator.
    pub epsilon: f64,
}

impl Default for NirModel {
    fn default() -> Self {
        Self {
            a: DEFAULT_A,
            b: DEFAULT_B,
            epsilon: DEFAULT_EPSILON,
        }
    }
}

impl NirModel {
    pub fn nir(&self, green: f64) -> f64 {
        (self.a - green) / self.b
    }

    pub fn ndvi(&self, nir: f64, red: f64) -> f64 {
        (nir - red) / (nir + red + self.epsilon)
    }
}

/// Co-registered bands of one clip: the inputs plus the derived NIR and NDVI.
#[derive(Debug, Clone)]
pub struct VegetationIndexResult {
    pub red: Array2<f64>,
    pub green: Array2<f64>,
    pub blue: Array2<f64>,
    pub nir: Array2<f64>,
    pub ndvi: Array2<f64>,
    pub extent: Extent,
    pub transform: GeoTransform,
}

pub fn derive(clipped: &ClippedBands, model: &NirModel) -> VegetationIndexResult {
    let mut nir = clipped.green.mapv(|g| model.nir(g));
    let mut ndvi = Zip::from(&nir)
        .and(&clipped.red)
        .map_collect(|&n, &r| model.ndvi(n, r));

    // The epsilon keeps the division defined, so missing samples have to be restored here.
    Zip::from(&mut nir)
        .and(&mut ndvi)
        .and(&clipped.red)
        .and(&clipped.green)
        .for_each(|n, v, &r, &g| {
            if r.is_nan() || g.is_nan() {
                *n = f64::NAN;
                *v = f64::NAN;
            } else if !v.is_finite() {
                *v = f64::NAN;
            }
        });

    VegetationIndexResult {
        red: clipped.red.clone(),
        green: clipped.green.clone(),
        blue: clipped.blue.clone(),
        nir,
        ndvi,
        extent: clipped.extent,
        transform: clipped.transform,
    }
}
