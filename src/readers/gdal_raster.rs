use gdal::Dataset;
use ndarray::Array2;
use std::path::Path;

use super::{GeoTransform, PixelWindow, RasterInfo, RasterReader};
use crate::error::{PipelineError, Result};

/// A raster opened through GDAL. The handle is released when this value is dropped.
pub struct GdalRaster {
    dataset: Dataset,
    info: RasterInfo,
}

impl GdalRaster {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PipelineError::InputNotFound(path.to_path_buf()));
        }

        let dataset = Dataset::open(path)?;
        let (width, height) = dataset.raster_size();
        let band_count = dataset.raster_count();
        let transform = GeoTransform::from_gdal(dataset.geo_transform()?)?;

        let nodata = if band_count > 0 {
            dataset.rasterband(1)?.no_data_value()
        } else {
            None
        };

        let crs_wkt = dataset
            .spatial_ref()
            .ok()
            .and_then(|srs| srs.to_wkt().ok())
            .filter(|wkt| !wkt.is_empty());

        let info = RasterInfo {
            width,
            height,
            band_count,
            transform,
            nodata,
            crs_wkt,
        };

        log::debug!("Opened raster {}:\n{}", path.display(), info);

        Ok(Self { dataset, info })
    }
}

impl RasterReader for GdalRaster {
    fn info(&self) -> &RasterInfo {
        &self.info
    }

    fn read_window(&self, band: usize, window: &PixelWindow) -> Result<Array2<f64>> {
        if band == 0 || band > self.info.band_count {
            return Err(PipelineError::BandCount {
                requested: band,
                available: self.info.band_count,
            });
        }

        let rasterband = self.dataset.rasterband(band)?;
        let size = (window.cols, window.rows);
        let buffer = rasterband.read_as::<f64>(
            (window.col_off as isize, window.row_off as isize),
            size,
            size,
            None,
        )?;

        Ok(Array2::from_shape_vec(
            (window.rows, window.cols),
            buffer.data().to_vec(),
        )?)
    }
}
