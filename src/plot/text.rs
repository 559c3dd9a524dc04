//! Labels drawn with an embedded TrueType font.

use image::imageops;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use rusttype::{Font, Scale};

/// Embedded font data - DejaVu Sans
const FONT_DATA: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

pub const TEXT_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

/// Point of the text box placed on the anchor coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    TopLeft,
    TopCenter,
    Center,
    MiddleLeft,
    MiddleRight,
}

pub struct Typeface {
    font: Font<'static>,
}

impl Typeface {
    /// The embedded font, or `None` (with a warning) when it cannot be parsed.
    pub fn embedded() -> Option<Self> {
        match Font::try_from_bytes(FONT_DATA) {
            Some(font) => Some(Self { font }),
            None => {
                log::warn!("Embedded font could not be parsed, text is omitted");
                None
            }
        }
    }

    /// Width and line height of `text` at `size` pixels.
    pub fn measure(&self, text: &str, size: f32) -> (u32, u32) {
        let scale = Scale::uniform(size);
        let (width, _) = text_size(scale, &self.font, text);
        let metrics = self.font.v_metrics(scale);
        (
            width.max(0) as u32,
            (metrics.ascent - metrics.descent).ceil().max(0.0) as u32,
        )
    }

    pub fn draw(
        &self,
        canvas: &mut RgbImage,
        text: &str,
        (x, y): (i32, i32),
        anchor: Anchor,
        size: f32,
        color: Rgb<u8>,
    ) {
        let (width, height) = self.measure(text, size);
        let (w, h) = (width as i32, height as i32);
        let (left, top) = match anchor {
            Anchor::TopLeft => (x, y),
            Anchor::TopCenter => (x - w / 2, y),
            Anchor::Center => (x - w / 2, y - h / 2),
            Anchor::MiddleLeft => (x, y - h / 2),
            Anchor::MiddleRight => (x - w, y - h / 2),
        };
        draw_text_mut(canvas, color, left, top, Scale::uniform(size), &self.font, text);
    }

    /// Draws `text` reading bottom to top, centred on `(x, y)`.
    pub fn draw_vertical(
        &self,
        canvas: &mut RgbImage,
        text: &str,
        (x, y): (i32, i32),
        size: f32,
        color: Rgb<u8>,
        background: Rgb<u8>,
    ) {
        let (width, height) = self.measure(text, size);
        if width == 0 || height == 0 {
            return;
        }

        let mut label = RgbImage::from_pixel(width, height, background);
        draw_text_mut(&mut label, color, 0, 0, Scale::uniform(size), &self.font, text);
        let rotated = imageops::rotate270(&label);

        let left = x as i64 - (height / 2) as i64;
        let top = y as i64 - (width / 2) as i64;
        imageops::overlay(canvas, &rotated, left, top);
    }
}

#[cfg(test)]
pub(crate) fn dark_pixels(canvas: &RgbImage, x: u32, y: u32, width: u32, height: u32) -> usize {
    (y..y + height)
        .flat_map(|py| (x..x + width).map(move |px| (px, py)))
        .filter(|&(px, py)| {
            let Rgb([r, g, b]) = *canvas.get_pixel(px, py);
            (r as u32 + g as u32 + b as u32) < 3 * 128
        })
        .count()
}
