//! Panel layout and primitive drawing on an RGB canvas.

use geo::{LineString, MultiPolygon};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use super::colormap::Colormap;
use crate::extent::Extent;

pub const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
pub const PLACEHOLDER: Rgb<u8> = Rgb([224, 224, 224]);
pub const FRAME_COLOR: Rgb<u8> = Rgb([64, 64, 64]);
pub const TICK_LENGTH: f32 = 5.0;

/// Axis-aligned region of the canvas, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Frame {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn inset(&self, margin: u32) -> Self {
        Self {
            x: self.x + margin,
            y: self.y + margin,
            width: self.width.saturating_sub(2 * margin),
            height: self.height.saturating_sub(2 * margin),
        }
    }

    /// Splits off a strip of `strip_width` on the right, separated by `gap`.
    pub fn split_right(&self, strip_width: u32, gap: u32) -> (Self, Self) {
        let main_width = self.width.saturating_sub(strip_width + gap);
        let main = Self {
            width: main_width,
            ..*self
        };
        let strip = Self {
            x: self.x + main_width + gap,
            width: strip_width.min(self.width),
            ..*self
        };
        (main, strip)
    }

    /// Splits off a band of `height` at the top.
    pub fn split_top(&self, height: u32) -> (Self, Self) {
        let top_height = height.min(self.height);
        let top = Self {
            height: top_height,
            ..*self
        };
        let rest = Self {
            y: self.y + top_height,
            height: self.height - top_height,
            ..*self
        };
        (top, rest)
    }

    pub fn center(&self) -> (i32, i32) {
        (
            (self.x + self.width / 2) as i32,
            (self.y + self.height / 2) as i32,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    fn rect(&self) -> Option<Rect> {
        (!self.is_empty()).then(|| {
            Rect::at(self.x as i32, self.y as i32).of_size(self.width, self.height)
        })
    }
}

pub fn fill(canvas: &mut RgbImage, frame: Frame, color: Rgb<u8>) {
    if let Some(rect) = frame.rect() {
        draw_filled_rect_mut(canvas, rect, color);
    }
}

pub fn outline(canvas: &mut RgbImage, frame: Frame, color: Rgb<u8>) {
    if let Some(rect) = frame.rect() {
        draw_hollow_rect_mut(canvas, rect, color);
    }
}

/// Panel drawn in place of an image that could not be produced.
pub fn draw_placeholder(canvas: &mut RgbImage, frame: Frame) {
    fill(canvas, frame, PLACEHOLDER);
    outline(canvas, frame, FRAME_COLOR);
}

/// Draws `image` centred in `frame` at the largest scale that keeps its aspect ratio.
/// Returns where it landed.
pub fn draw_fitted(
    canvas: &mut RgbImage,
    image: &RgbImage,
    frame: Frame,
    filter: FilterType,
) -> Option<Frame> {
    let (iw, ih) = image.dimensions();
    if iw == 0 || ih == 0 || frame.is_empty() {
        draw_placeholder(canvas, frame);
        return None;
    }

    let scale = (frame.width as f64 / iw as f64).min(frame.height as f64 / ih as f64);
    let width = ((iw as f64 * scale).round() as u32).clamp(1, frame.width);
    let height = ((ih as f64 * scale).round() as u32).clamp(1, frame.height);
    let placed = Frame::new(
        frame.x + (frame.width - width) / 2,
        frame.y + (frame.height - height) / 2,
        width,
        height,
    );

    let resized = imageops::resize(image, width, height, filter);
    imageops::overlay(canvas, &resized, placed.x as i64, placed.y as i64);
    Some(placed)
}

/// Vertical colour bar, low values at the bottom, with tick marks at `ticks` (0 to 1).
pub fn draw_colorbar(canvas: &mut RgbImage, frame: Frame, colormap: Colormap, ticks: &[f64]) {
    if frame.is_empty() {
        return;
    }

    let span = (frame.height - 1).max(1) as f64;
    for dy in 0..frame.height {
        let t = 1.0 - dy as f64 / span;
        let color = colormap.evaluate(t);
        for dx in 0..frame.width {
            canvas.put_pixel(frame.x + dx, frame.y + dy, color);
        }
    }
    outline(canvas, frame, FRAME_COLOR);

    let right = (frame.x + frame.width) as f32;
    for &tick in ticks {
        let y = tick_y(frame, tick);
        draw_line_segment_mut(canvas, (right, y), (right + TICK_LENGTH, y), FRAME_COLOR);
    }
}

/// Canvas row of a colour bar tick at `tick` (0 to 1).
pub fn tick_y(frame: Frame, tick: f64) -> f32 {
    let span = (frame.height.saturating_sub(1)).max(1) as f64;
    frame.y as f32 + ((1.0 - tick.clamp(0.0, 1.0)) * span) as f32
}

/// Polyline of `thickness` pixels, approximated by offset single-pixel strokes.
pub fn draw_polyline(
    canvas: &mut RgbImage,
    points: &[(f32, f32)],
    color: Rgb<u8>,
    thickness: u32,
) {
    let half = thickness.saturating_sub(1) as f32 / 2.0;
    let offsets: Vec<f32> = (0..thickness.max(1)).map(|i| i as f32 - half).collect();

    for pair in points.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        for &ox in &offsets {
            for &oy in &offsets {
                draw_line_segment_mut(
                    canvas,
                    (start.0 + ox, start.1 + oy),
                    (end.0 + ox, end.1 + oy),
                    color,
                );
            }
        }
    }
}

/// Maps map coordinates inside `extent` onto the pixels of `placed`.
#[derive(Debug, Clone, Copy)]
pub struct MapProjection {
    extent: Extent,
    placed: Frame,
}

impl MapProjection {
    pub fn new(extent: Extent, placed: Frame) -> Option<Self> {
        (extent.width() > 0.0 && extent.height() > 0.0 && !placed.is_empty())
            .then_some(Self { extent, placed })
    }

    pub fn to_canvas(&self, x: f64, y: f64) -> (f32, f32) {
        let fx = (x - self.extent.min_x) / self.extent.width();
        let fy = (self.extent.max_y - y) / self.extent.height();
        (
            self.placed.x as f32 + (fx * self.placed.width as f64) as f32,
            self.placed.y as f32 + (fy * self.placed.height as f64) as f32,
        )
    }
}

/// Draws every ring of `geometry`.
pub fn draw_boundary(
    canvas: &mut RgbImage,
    geometry: &MultiPolygon<f64>,
    projection: &MapProjection,
    color: Rgb<u8>,
    thickness: u32,
) {
    let mut draw_ring = |ring: &LineString<f64>| {
        let points: Vec<(f32, f32)> = ring
            .coords()
            .map(|c| projection.to_canvas(c.x, c.y))
            .collect();
        draw_polyline(canvas, &points, color, thickness);
    };

    for polygon in geometry {
        draw_ring(polygon.exterior());
        polygon.interiors().iter().for_each(&mut draw_ring);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn test_frame_split_and_inset() {
        let frame = Frame::new(10, 20, 300, 200);

        let (main, strip) = frame.split_right(20, 10);
        assert_eq!(main, Frame::new(10, 20, 270, 200));
        assert_eq!(strip, Frame::new(290, 20, 20, 200));

        assert_eq!(frame.inset(5), Frame::new(15, 25, 290, 190));

        let (title, rest) = frame.split_top(30);
        assert_eq!(title, Frame::new(10, 20, 300, 30));
        assert_eq!(rest, Frame::new(10, 50, 300, 170));
        assert_eq!(frame.center(), (160, 120));
        assert!(Frame::new(0, 0, 4, 4).inset(3).is_empty());
    }

    #[test]
    fn test_draw_fitted_keeps_aspect_ratio() {
        let mut canvas = RgbImage::from_pixel(200, 100, BACKGROUND);
        let image = RgbImage::from_pixel(40, 10, Rgb([10, 200, 30]));

        let placed = draw_fitted(
            &mut canvas,
            &image,
            Frame::new(0, 0, 200, 100),
            FilterType::Nearest,
        )
        .unwrap();

        assert_eq!(placed, Frame::new(0, 25, 200, 50));
        assert_eq!(*canvas.get_pixel(100, 50), Rgb([10, 200, 30]));
        assert_eq!(*canvas.get_pixel(100, 10), BACKGROUND);
    }

    #[test]
    fn test_draw_fitted_empty_image_is_placeholder() {
        let mut canvas = RgbImage::from_pixel(50, 50, BACKGROUND);

        let placed = draw_fitted(
            &mut canvas,
            &RgbImage::new(0, 0),
            Frame::new(0, 0, 50, 50),
            FilterType::Nearest,
        );

        assert!(placed.is_none());
        assert_eq!(*canvas.get_pixel(10, 30), PLACEHOLDER);
    }

    #[test]
    fn test_colorbar_runs_low_to_high() {
        let mut canvas = RgbImage::from_pixel(40, 110, BACKGROUND);

        draw_colorbar(&mut canvas, Frame::new(5, 5, 20, 101), Colormap::Gray, &[0.0, 1.0]);

        assert_eq!(*canvas.get_pixel(15, 6), Rgb([252, 252, 252]));
        assert_eq!(*canvas.get_pixel(15, 104), Rgb([3, 3, 3]));
    }

    #[test]
    fn test_boundary_lands_on_projected_pixels() {
        let mut canvas = RgbImage::from_pixel(100, 100, BACKGROUND);
        let projection = MapProjection::new(
            Extent::new(0.0, 10.0, 0.0, 10.0),
            Frame::new(0, 0, 100, 100),
        )
        .unwrap();
        let square = MultiPolygon::new(vec![polygon![
            (x: 2.0, y: 2.0),
            (x: 8.0, y: 2.0),
            (x: 8.0, y: 8.0),
            (x: 2.0, y: 8.0),
            (x: 2.0, y: 2.0),
        ]]);

        draw_boundary(&mut canvas, &square, &projection, Rgb([255, 0, 0]), 1);

        assert_eq!(projection.to_canvas(2.0, 8.0), (20.0, 20.0));
        assert_eq!(*canvas.get_pixel(50, 20), Rgb([255, 0, 0]));
        assert_eq!(*canvas.get_pixel(50, 50), BACKGROUND);
    }
}
