//! Error types for the extraction pipeline.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("input not found: {0}")]
    InputNotFound(PathBuf),

    #[error("coordinate reference system error: {0}")]
    CoordinateSystem(String),

    #[error("parcel {0} does not intersect the raster extent")]
    GeometryOutOfBounds(String),

    #[error("insufficient valid samples: need at least {required}, found {found}")]
    InsufficientData { required: usize, found: usize },

    #[error("contrast enhancement failed: {0}")]
    Enhancement(String),

    #[error("no polygonal geometry found in {0}")]
    EmptyGeometry(PathBuf),

    #[error("raster has {available} bands, band {requested} was requested")]
    BandCount { requested: usize, available: usize },

    #[error("rotated or skewed geotransforms are not supported: {0:?}")]
    UnsupportedGeoTransform([f64; 6]),

    #[error("no parcel shapefiles found in {0}")]
    NoParcels(PathBuf),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("invalid file pattern: {0}")]
    Glob(#[from] glob::PatternError),

    #[error("invalid name pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
