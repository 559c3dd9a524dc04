//! Biomass regression chart: the calibrated line over NDVI 0 to 1 and the parcel's point.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};

use super::canvas::{self, BACKGROUND, FRAME_COLOR, Frame, draw_polyline};
use super::text::{Anchor, TEXT_COLOR, Typeface};
use crate::biomass::{BiomassEstimate, BiomassModel};

pub const CHART_WIDTH: u32 = 800;
pub const CHART_HEIGHT: u32 = 600;

const MARGIN: u32 = 70;
const LINE_SAMPLES: usize = 50;
const GRID_DIVISIONS: u32 = 10;
const POINT_RADIUS: i32 = 6;

const TITLE_SIZE: f32 = 18.0;
const AXIS_LABEL_SIZE: f32 = 14.0;
const TICK_LABEL_SIZE: f32 = 12.0;

pub const REGRESSION_COLOR: Rgb<u8> = Rgb([214, 39, 40]);
pub const POINT_COLOR: Rgb<u8> = Rgb([31, 119, 180]);
const GRID_COLOR: Rgb<u8> = Rgb([220, 220, 220]);

/// Data to pixel mapping of the plot area.
#[derive(Debug, Clone, Copy)]
pub struct ChartScale {
    area: Frame,
    x_range: (f64, f64),
    y_range: (f64, f64),
}

impl ChartScale {
    fn new(area: Frame, x_range: (f64, f64), y_range: (f64, f64)) -> Self {
        Self {
            area,
            x_range,
            y_range,
        }
    }

    pub fn to_canvas(&self, x: f64, y: f64) -> (f32, f32) {
        let fx = (x - self.x_range.0) / (self.x_range.1 - self.x_range.0);
        let fy = (y - self.y_range.0) / (self.y_range.1 - self.y_range.0);
        (
            self.area.x as f32 + (fx * self.area.width as f64) as f32,
            (self.area.y + self.area.height) as f32 - (fy * self.area.height as f64) as f32,
        )
    }
}

/// Scale covering NDVI 0 to 1, the unfloored regression line and the parcel point.
pub fn chart_scale(model: &BiomassModel, estimate: &BiomassEstimate) -> ChartScale {
    let area = Frame::new(0, 0, CHART_WIDTH, CHART_HEIGHT).inset(MARGIN);

    let x_min = estimate.ndvi_statistic.min(0.0);
    let x_max = estimate.ndvi_statistic.max(1.0);

    let line = |x: f64| model.slope * x + model.intercept;
    let candidates = [line(x_min), line(x_max), estimate.biomass];
    let y_min = candidates.iter().copied().fold(f64::INFINITY, f64::min);
    let y_max = candidates.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let pad = ((y_max - y_min) * 0.05).max(1.0);

    ChartScale::new(area, (x_min, x_max), (y_min - pad, y_max + pad))
}

/// Chart of the regression line with the parcel's point, labelled with `parcel`.
pub fn render_biomass_chart(
    model: &BiomassModel,
    estimate: &BiomassEstimate,
    parcel: &str,
) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(CHART_WIDTH, CHART_HEIGHT, BACKGROUND);
    let scale = chart_scale(model, estimate);
    let area = scale.area;

    for i in 1..GRID_DIVISIONS {
        let x = (area.x + area.width * i / GRID_DIVISIONS) as f32;
        let y = (area.y + area.height * i / GRID_DIVISIONS) as f32;
        let (left, right) = (area.x as f32, (area.x + area.width) as f32);
        let (top, bottom) = (area.y as f32, (area.y + area.height) as f32);
        draw_line_segment_mut(&mut canvas, (x, top), (x, bottom), GRID_COLOR);
        draw_line_segment_mut(&mut canvas, (left, y), (right, y), GRID_COLOR);
    }
    canvas::outline(&mut canvas, area, FRAME_COLOR);

    let (x_min, x_max) = scale.x_range;
    let points: Vec<(f32, f32)> = (0..LINE_SAMPLES)
        .map(|i| {
            let x = x_min + (x_max - x_min) * i as f64 / (LINE_SAMPLES - 1) as f64;
            scale.to_canvas(x, model.slope * x + model.intercept)
        })
        .collect();
    draw_polyline(&mut canvas, &points, REGRESSION_COLOR, 2);

    let (px, py) = scale.to_canvas(estimate.ndvi_statistic, estimate.biomass);
    draw_filled_circle_mut(
        &mut canvas,
        (px.round() as i32, py.round() as i32),
        POINT_RADIUS,
        POINT_COLOR,
    );

    if let Some(typeface) = Typeface::embedded() {
        draw_labels(&mut canvas, &typeface, &scale);
        draw_legend(&mut canvas, &typeface, area, parcel);
    }

    canvas
}

fn draw_labels(canvas: &mut RgbImage, typeface: &Typeface, scale: &ChartScale) {
    let area = scale.area;
    let bottom = area.y + area.height;
    let (x_min, x_max) = scale.x_range;
    let (y_min, y_max) = scale.y_range;

    for i in (0..=GRID_DIVISIONS).step_by(2) {
        let fraction = i as f64 / GRID_DIVISIONS as f64;

        let x = (area.x + area.width * i / GRID_DIVISIONS) as i32;
        let text = format!("{:.1}", x_min + (x_max - x_min) * fraction);
        typeface.draw(
            canvas,
            &text,
            (x, bottom as i32 + 6),
            Anchor::TopCenter,
            TICK_LABEL_SIZE,
            TEXT_COLOR,
        );

        let y = (bottom - area.height * i / GRID_DIVISIONS) as i32;
        let text = format!("{:.0}", y_min + (y_max - y_min) * fraction);
        typeface.draw(
            canvas,
            &text,
            (area.x as i32 - 6, y),
            Anchor::MiddleRight,
            TICK_LABEL_SIZE,
            TEXT_COLOR,
        );
    }

    let (center_x, center_y) = area.center();
    typeface.draw(
        canvas,
        "Estimativa de MVLF vs NDVI",
        (center_x, (MARGIN / 2) as i32),
        Anchor::Center,
        TITLE_SIZE,
        TEXT_COLOR,
    );
    typeface.draw(
        canvas,
        "NDVI-P25",
        (center_x, bottom as i32 + 30),
        Anchor::TopCenter,
        AXIS_LABEL_SIZE,
        TEXT_COLOR,
    );
    typeface.draw_vertical(
        canvas,
        "MVLF (kg/ha)",
        (16, center_y),
        AXIS_LABEL_SIZE,
        TEXT_COLOR,
        BACKGROUND,
    );
}

/// Legend box in the upper-left corner of the plot area.
fn draw_legend(canvas: &mut RgbImage, typeface: &Typeface, area: Frame, parcel: &str) {
    const PAD: u32 = 8;
    const SAMPLE: u32 = 24;
    const ROW: u32 = 20;

    let point_label = format!("Ponto {}", parcel);
    let labels = ["Regressão MVLF", point_label.as_str()];
    let text_width = labels
        .iter()
        .map(|text| typeface.measure(text, TICK_LABEL_SIZE).0)
        .max()
        .unwrap_or(0);

    let frame = Frame::new(
        area.x + PAD,
        area.y + PAD,
        PAD + SAMPLE + PAD + text_width + PAD,
        PAD + ROW * labels.len() as u32,
    );
    canvas::fill(canvas, frame, BACKGROUND);
    canvas::outline(canvas, frame, FRAME_COLOR);

    let x0 = (frame.x + PAD) as f32;
    let row_y = |row: u32| (frame.y + PAD / 2 + ROW * row + ROW / 2) as f32;

    draw_polyline(
        canvas,
        &[(x0, row_y(0)), (x0 + SAMPLE as f32, row_y(0))],
        REGRESSION_COLOR,
        2,
    );
    draw_filled_circle_mut(
        canvas,
        ((x0 + SAMPLE as f32 / 2.0) as i32, row_y(1) as i32),
        POINT_RADIUS - 1,
        POINT_COLOR,
    );

    let text_x = (frame.x + PAD + SAMPLE + PAD) as i32;
    for (row, text) in labels.iter().enumerate() {
        typeface.draw(
            canvas,
            text,
            (text_x, row_y(row as u32) as i32),
            Anchor::MiddleLeft,
            TICK_LABEL_SIZE,
            TEXT_COLOR,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::text::dark_pixels;

    #[test]
    fn test_chart_marks_parcel_point() {
        let model = BiomassModel::default();
        let estimate = BiomassEstimate {
            ndvi_statistic: 0.5,
            biomass: model.estimate(0.5),
        };

        let chart = render_biomass_chart(&model, &estimate, "Parcela 1");
        let (px, py) = chart_scale(&model, &estimate).to_canvas(0.5, estimate.biomass);

        assert_eq!(chart.dimensions(), (CHART_WIDTH, CHART_HEIGHT));
        assert_eq!(
            *chart.get_pixel(px.round() as u32, py.round() as u32),
            POINT_COLOR
        );
    }

    #[test]
    fn test_chart_is_labelled() {
        let model = BiomassModel::default();
        let estimate = BiomassEstimate {
            ndvi_statistic: 0.5,
            biomass: model.estimate(0.5),
        };

        let chart = render_biomass_chart(&model, &estimate, "Parcela 1");
        let bottom = CHART_HEIGHT - MARGIN;

        // Title, x axis labels, y axis labels.
        assert!(dark_pixels(&chart, MARGIN, 0, CHART_WIDTH - 2 * MARGIN, MARGIN - 4) > 0);
        assert!(dark_pixels(&chart, MARGIN, bottom + 2, CHART_WIDTH - 2 * MARGIN, MARGIN - 4) > 0);
        assert!(dark_pixels(&chart, 0, MARGIN, MARGIN - 2, CHART_HEIGHT - 2 * MARGIN) > 0);

        // Legend box in the upper-left corner of the plot area.
        assert_eq!(*chart.get_pixel(MARGIN + 8, MARGIN + 20), FRAME_COLOR);
        assert!(dark_pixels(&chart, MARGIN + 40, MARGIN + 10, 120, 40) > 0);
    }

    #[test]
    fn test_scale_covers_line_and_point() {
        let model = BiomassModel::default();
        let estimate = BiomassEstimate {
            ndvi_statistic: 0.02,
            biomass: 0.0,
        };
        let scale = chart_scale(&model, &estimate);

        for (x, y) in [(0.0, model.intercept), (1.0, model.slope + model.intercept), (0.02, 0.0)]
        {
            let (cx, cy) = scale.to_canvas(x, y);
            assert!((MARGIN as f32..=(CHART_WIDTH - MARGIN) as f32).contains(&cx));
            assert!((MARGIN as f32..=(CHART_HEIGHT - MARGIN) as f32).contains(&cy));
        }
    }
}
