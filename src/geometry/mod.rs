//! Parcel and context geometry: reprojection into the raster CRS and union into one mask.
//!
//! Every feature of a layer is merged into a single multipolygon, so a layer holding several
//! disjoint polygons produces one combined mask rather than one output per feature.

use geo::MultiPolygon;
use std::path::Path;

use crate::error::Result;
use crate::readers::RasterReader;

pub mod ogr;
pub mod union;

pub use ogr::OgrLoader;
pub use union::union_all;

pub trait GeometryLoader {
    /// Loads every feature of `path`, reprojected into `target_crs_wkt` and unioned.
    fn load(&self, path: &Path, target_crs_wkt: &str) -> Result<MultiPolygon<f64>>;
}

/// Loads `path` in the CRS of `raster`. Fails before touching the vector file when the
/// raster has no CRS.
pub fn load_for_raster<L, R>(loader: &L, raster: &R, path: &Path) -> Result<MultiPolygon<f64>>
where
    L: GeometryLoader + ?Sized,
    R: RasterReader + ?Sized,
{
    let crs = raster.info().require_crs()?;
    loader.load(path, crs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::readers::{GeoTransform, MemoryRaster};
    use ndarray::Array2;
    use std::cell::Cell;

    struct CountingLoader {
        calls: Cell<usize>,
    }

    impl GeometryLoader for CountingLoader {
        fn load(&self, _path: &Path, _target_crs_wkt: &str) -> Result<MultiPolygon<f64>> {
            self.calls.set(self.calls.get() + 1);
            Ok(MultiPolygon::new(Vec::new()))
        }
    }

    #[test]
    fn test_raster_without_crs_stops_before_loading() {
        let raster = MemoryRaster::new(
            vec![Array2::zeros((2, 2))],
            GeoTransform::new(0.0, 1.0, 2.0, -1.0),
            None,
            None,
        )
        .unwrap();
        let loader = CountingLoader {
            calls: Cell::new(0),
        };

        let err = load_for_raster(&loader, &raster, Path::new("parcel.shp")).unwrap_err();

        assert!(matches!(err, PipelineError::CoordinateSystem(_)));
        assert_eq!(loader.calls.get(), 0);
    }
}
