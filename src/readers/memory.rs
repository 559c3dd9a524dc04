use ndarray::{Array2, ErrorKind, ShapeError, s};

use super::{GeoTransform, PixelWindow, RasterInfo, RasterReader};
use crate::error::{PipelineError, Result};

/// Raster held entirely in memory, e.g. synthesized scenes or pre-read tiles.
#[derive(Debug, Clone)]
pub struct MemoryRaster {
    info: RasterInfo,
    bands: Vec<Array2<f64>>,
}

impl MemoryRaster {
    /// All bands must share one shape.
    pub fn new(
        bands: Vec<Array2<f64>>,
        transform: GeoTransform,
        nodata: Option<f64>,
        crs_wkt: Option<String>,
    ) -> Result<Self> {
        let (height, width) = bands.first().map(|b| b.dim()).unwrap_or((0, 0));

        if let Some(band) = bands.iter().find(|b| b.dim() != (height, width)) {
            log::debug!(
                "band shape {:?} differs from {:?}",
                band.dim(),
                (height, width)
            );
            return Err(PipelineError::Shape(ShapeError::from_kind(
                ErrorKind::IncompatibleShape,
            )));
        }

        let info = RasterInfo {
            width,
            height,
            band_count: bands.len(),
            transform,
            nodata,
            crs_wkt,
        };

        Ok(Self { info, bands })
    }
}

impl RasterReader for MemoryRaster {
    fn info(&self) -> &RasterInfo {
        &self.info
    }

    fn read_window(&self, band: usize, window: &PixelWindow) -> Result<Array2<f64>> {
        let data = band
            .checked_sub(1)
            .and_then(|i| self.bands.get(i))
            .ok_or(PipelineError::BandCount {
                requested: band,
                available: self.bands.len(),
            })?;

        let rows = window.row_off..window.row_off + window.rows;
        let cols = window.col_off..window.col_off + window.cols;
        Ok(data.slice(s![rows, cols]).to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn raster() -> MemoryRaster {
        let band = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        MemoryRaster::new(
            vec![band.clone(), band * 10.0],
            GeoTransform::new(0.0, 1.0, 2.0, -1.0),
            None,
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_read_window() {
        let window = PixelWindow {
            col_off: 1,
            row_off: 1,
            cols: 2,
            rows: 1,
        };

        let values = raster().read_window(2, &window).unwrap();
        assert_eq!(values, array![[50.0, 60.0]]);
    }

    #[test]
    fn test_band_out_of_range() {
        let window = PixelWindow {
            col_off: 0,
            row_off: 0,
            cols: 1,
            rows: 1,
        };

        assert!(matches!(
            raster().read_window(3, &window),
            Err(PipelineError::BandCount {
                requested: 3,
                available: 2
            })
        ));
        assert!(raster().read_window(0, &window).is_err());
    }

    #[test]
    fn test_missing_crs_is_reported() {
        let err = raster().info().require_crs().unwrap_err();
        assert!(matches!(err, PipelineError::CoordinateSystem(_)));
    }

    #[test]
    fn test_mismatched_band_shapes() {
        let result = MemoryRaster::new(
            vec![Array2::zeros((2, 2)), Array2::zeros((3, 2))],
            GeoTransform::new(0.0, 1.0, 0.0, -1.0),
            None,
            None,
        );
        assert!(result.is_err());
    }
}
