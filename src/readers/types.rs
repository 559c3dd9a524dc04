use ndarray::Array2;
use std::fmt;

use crate::error::{PipelineError, Result};
use crate::extent::Extent;

/// Read access to a georeferenced multi-band raster.
pub trait RasterReader {
    fn info(&self) -> &RasterInfo;

    /// Reads one 1-based band over `window` as `f64`, rows first.
    fn read_window(&self, band: usize, window: &PixelWindow) -> Result<Array2<f64>>;
}

/// North-up affine transform (GDAL coefficient order without the rotation terms).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub origin_y: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, pixel_width: f64, origin_y: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            pixel_width,
            origin_y,
            pixel_height,
        }
    }

    pub fn from_gdal(coeffs: [f64; 6]) -> Result<Self> {
        if coeffs[2] != 0.0 || coeffs[4] != 0.0 || coeffs[1] == 0.0 || coeffs[5] == 0.0 {
            return Err(PipelineError::UnsupportedGeoTransform(coeffs));
        }
        Ok(Self::new(coeffs[0], coeffs[1], coeffs[3], coeffs[5]))
    }

    /// Map coordinates of the centre of pixel (`col`, `row`).
    pub fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        (
            self.origin_x + (col as f64 + 0.5) * self.pixel_width,
            self.origin_y + (row as f64 + 0.5) * self.pixel_height,
        )
    }

    /// Fractional pixel position (col, row) of a map coordinate.
    pub fn to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.origin_x) / self.pixel_width,
            (y - self.origin_y) / self.pixel_height,
        )
    }

    /// Transform of a sub-window starting at `window`'s upper-left pixel.
    pub fn shifted(&self, window: &PixelWindow) -> Self {
        Self {
            origin_x: self.origin_x + window.col_off as f64 * self.pixel_width,
            origin_y: self.origin_y + window.row_off as f64 * self.pixel_height,
            ..*self
        }
    }

    pub fn extent(&self, rows: usize, cols: usize) -> Extent {
        Extent::from_window(
            self.origin_x,
            self.origin_y,
            self.pixel_width,
            self.pixel_height,
            rows,
            cols,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    pub col_off: usize,
    pub row_off: usize,
    pub cols: usize,
    pub rows: usize,
}

#[derive(Debug, Clone)]
pub struct RasterInfo {
    pub width: usize,
    pub height: usize,
    pub band_count: usize,
    pub transform: GeoTransform,
    /// Declared no-data value of the first band, if any.
    pub nodata: Option<f64>,
    pub crs_wkt: Option<String>,
}

impl RasterInfo {
    /// WKT of the raster CRS; a raster without one cannot be clipped reliably.
    pub fn require_crs(&self) -> Result<&str> {
        self.crs_wkt
            .as_deref()
            .filter(|wkt| !wkt.trim().is_empty())
            .ok_or_else(|| {
                PipelineError::CoordinateSystem(
                    "raster has no coordinate reference system defined".to_string(),
                )
            })
    }

    pub fn extent(&self) -> Extent {
        self.transform.extent(self.height, self.width)
    }
}

impl fmt::Display for RasterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Width: {}\nHeight: {}\nBands: {}\nNo data: {:?}\nCRS defined: {}",
            self.width,
            self.height,
            self.band_count,
            self.nodata,
            self.crs_wkt.is_some(),
        )
    }
}
