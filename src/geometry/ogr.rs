use gdal::Dataset;
use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};
use gdal::vector::LayerAccess;
use geo::MultiPolygon;
use std::path::Path;

use super::{GeometryLoader, union_all};
use crate::error::{PipelineError, Result};

/// Reads vector layers through GDAL/OGR.
#[derive(Debug, Default, Clone, Copy)]
pub struct OgrLoader;

impl GeometryLoader for OgrLoader {
    fn load(&self, path: &Path, target_crs_wkt: &str) -> Result<MultiPolygon<f64>> {
        if !path.exists() {
            return Err(PipelineError::InputNotFound(path.to_path_buf()));
        }

        let dataset = Dataset::open(path)?;
        let mut layer = dataset.layer(0)?;

        // The layer's own CRS is the only trusted source; it is never guessed.
        let mut source_srs = layer.spatial_ref().ok_or_else(|| {
            PipelineError::CoordinateSystem(format!(
                "vector layer {} has no coordinate reference system",
                path.display()
            ))
        })?;
        let mut target_srs = SpatialRef::from_wkt(target_crs_wkt)?;

        // GDAL >= 3 honours authority axis order (lat, lon for EPSG:4326) unless told otherwise.
        source_srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
        target_srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);

        let transform = CoordTransform::new(&source_srs, &target_srs)?;

        let mut parts = Vec::new();
        for feature in layer.features() {
            let Some(geometry) = feature.geometry() else {
                continue;
            };
            let projected = geometry.transform(&transform)?;
            parts.push(projected.to_geo()?);
        }

        log::debug!(
            "Unioning {} feature(s) from {} into one mask geometry",
            parts.len(),
            path.display()
        );

        let merged = union_all(parts);
        if merged.0.is_empty() {
            return Err(PipelineError::EmptyGeometry(path.to_path_buf()));
        }

        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdal::DriverManager;
    use gdal::vector::{Geometry, LayerOptions, OGRwkbGeometryType};
    use geo::BoundingRect;
    use tempfile::tempdir;

    /// Two overlapping squares near lon -51, lat -25 (UTM zone 22S central meridian).
    const FEATURES: [&str; 2] = [
        "POLYGON ((-51.001 -25.001, -50.9995 -25.001, -50.9995 -25.0, -51.001 -25.0, -51.001 -25.001))",
        "POLYGON ((-51.0 -25.001, -50.999 -25.001, -50.999 -25.0, -51.0 -25.0, -51.0 -25.001))",
    ];

    fn write_shapefile(path: &Path, srs: Option<&SpatialRef>, features: &[&str]) {
        let driver = DriverManager::get_driver_by_name("ESRI Shapefile").unwrap();
        let mut dataset = driver.create_vector_only(path).unwrap();
        let name = path.file_stem().unwrap().to_string_lossy().into_owned();
        let mut layer = dataset
            .create_layer(LayerOptions {
                name: &name,
                srs,
                ty: OGRwkbGeometryType::wkbPolygon,
                ..Default::default()
            })
            .unwrap();
        for wkt in features {
            layer
                .create_feature(Geometry::from_wkt(wkt).unwrap())
                .unwrap();
        }
    }

    fn utm_22s() -> String {
        SpatialRef::from_epsg(32722).unwrap().to_wkt().unwrap()
    }

    #[test]
    fn test_features_are_reprojected_and_unioned() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Parcela 1.shp");
        let wgs84 = SpatialRef::from_epsg(4326).unwrap();
        write_shapefile(&path, Some(&wgs84), &FEATURES);

        let merged = OgrLoader.load(&path, &utm_22s()).unwrap();

        assert_eq!(merged.0.len(), 1);
        let bounds = merged.bounding_rect().unwrap();
        // Longitude first: the central meridian lands on the 500 km false easting.
        assert!(bounds.min().x < 500_000.0 && bounds.max().x > 500_000.0);
        // 0.002 degrees of longitude at 25 S is about 202 m.
        let width = bounds.max().x - bounds.min().x;
        assert!((190.0..215.0).contains(&width), "width {}", width);
        assert!(bounds.min().y > 7_200_000.0 && bounds.max().y < 7_260_000.0);
    }

    #[test]
    fn test_layer_without_crs_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Parcela 2.shp");
        write_shapefile(&path, None, &FEATURES[..1]);

        let err = OgrLoader.load(&path, &utm_22s()).unwrap_err();
        assert!(matches!(err, PipelineError::CoordinateSystem(_)));
    }

    #[test]
    fn test_missing_vector_file() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("Parcela 1.shp");

        let err = OgrLoader.load(&missing, "").unwrap_err();
        assert!(matches!(err, PipelineError::InputNotFound(p) if p == missing));
    }
}
