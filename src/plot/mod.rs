//! PNG artifacts: the per-parcel figure and the biomass chart.

use image::{ImageFormat, Rgb, RgbImage};
use ndarray::Array2;
use std::path::Path;

use crate::error::Result;

pub mod canvas;
pub mod chart;
pub mod colormap;
pub mod context;
pub mod figure;
pub mod text;

pub use chart::render_biomass_chart;
pub use colormap::Colormap;
pub use context::{ContextBackground, prepare_context};
pub use figure::{FigureInput, figure_title, render_figure};

/// Stacks three equally shaped 8-bit channels into an RGB image.
pub fn rgb_image(red: &Array2<u8>, green: &Array2<u8>, blue: &Array2<u8>) -> RgbImage {
    let (rows, cols) = red.dim();
    RgbImage::from_fn(cols as u32, rows as u32, |x, y| {
        let idx = (y as usize, x as usize);
        Rgb([red[idx], green[idx], blue[idx]])
    })
}

pub fn save_png(image: &RgbImage, path: &Path) -> Result<()> {
    image.save_with_format(path, ImageFormat::Png)?;
    log::info!("Wrote {}", path.display());
    Ok(())
}
