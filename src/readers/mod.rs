pub mod gdal_raster;
pub mod memory;
pub mod types;

pub use gdal_raster::GdalRaster;
pub use memory::MemoryRaster;
pub use types::{GeoTransform, PixelWindow, RasterInfo, RasterReader};
