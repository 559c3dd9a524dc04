//! Downscaled RGB background of the context area, shared by every parcel figure.

use geo::MultiPolygon;
use image::RgbImage;
use image::imageops::{self, FilterType};
use std::path::Path;

use super::rgb_image;
use crate::clip::{ClipOutcome, clip};
use crate::config::Config;
use crate::error::Result;
use crate::extent::Extent;
use crate::geometry::{GeometryLoader, load_for_raster};
use crate::readers::RasterReader;
use crate::visual::normalize_visual;

#[derive(Debug, Clone)]
pub struct ContextBackground {
    pub image: RgbImage,
    /// Map extent covered by `image`.
    pub extent: Extent,
    /// Context geometry in the raster CRS.
    pub geometry: MultiPolygon<f64>,
}

/// Builds the context background, or `None` when it cannot be produced. Figures fall back
/// to a placeholder panel in that case.
pub fn prepare_context<R, L>(
    raster: &R,
    loader: &L,
    path: &Path,
    config: &Config,
) -> Option<ContextBackground>
where
    R: RasterReader + ?Sized,
    L: GeometryLoader + ?Sized,
{
    match build_context(raster, loader, path, config) {
        Ok(Some(context)) => Some(context),
        Ok(None) => {
            log::warn!(
                "Context area {} does not overlap the raster, continuing without it",
                path.display()
            );
            None
        }
        Err(err) => {
            log::warn!(
                "Context area {} unavailable, continuing without it: {}",
                path.display(),
                err
            );
            None
        }
    }
}

fn build_context<R, L>(
    raster: &R,
    loader: &L,
    path: &Path,
    config: &Config,
) -> Result<Option<ContextBackground>>
where
    R: RasterReader + ?Sized,
    L: GeometryLoader + ?Sized,
{
    let geometry = load_for_raster(loader, raster, path)?;
    let ClipOutcome::Clipped(bands) = clip(raster, &geometry, config.bands(), config.nodata())?
    else {
        return Ok(None);
    };

    let visual = config.visual();
    let image = rgb_image(
        &normalize_visual(&bands.red, visual),
        &normalize_visual(&bands.green, visual),
        &normalize_visual(&bands.blue, visual),
    );
    let (width, height) = image.dimensions();
    let image = downscale(image, config.context_max_size());

    log::debug!(
        "Context background {}x{} downscaled to {:?}",
        width,
        height,
        image.dimensions()
    );

    Ok(Some(ContextBackground {
        image,
        extent: bands.extent,
        geometry,
    }))
}

/// Shrinks `image` so its longest side is at most `max_size`; smaller images pass through.
pub fn downscale(image: RgbImage, max_size: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    let longest = width.max(height);
    if longest <= max_size || longest == 0 {
        return image;
    }

    let scale = max_size as f64 / longest as f64;
    let new_width = ((width as f64 * scale) as u32).max(1);
    let new_height = ((height as f64 * scale) as u32).max(1);
    imageops::resize(&image, new_width, new_height, FilterType::Triangle)
}
