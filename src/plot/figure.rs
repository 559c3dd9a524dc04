//! Multi-panel parcel figure.
//!
//! Six-column grid of three rows:
//! context map (4 columns) and parcel RGB (2), then Red, Green and Blue (2 each), then
//! estimated NIR and NDVI (3 each). Every panel is titled under a heading naming the parcel,
//! and band panels carry a labelled colour bar.

use chrono::{DateTime, Local};
use geo::MultiPolygon;
use image::imageops::FilterType;
use image::{Rgb, RgbImage};

use super::canvas::{
    self, BACKGROUND, FRAME_COLOR, Frame, MapProjection, TICK_LENGTH, draw_boundary,
    draw_colorbar, draw_fitted, draw_placeholder, draw_polyline, tick_y,
};
use super::colormap::Colormap;
use super::context::ContextBackground;
use super::rgb_image;
use super::text::{Anchor, TEXT_COLOR, Typeface};
use crate::index::VegetationIndexResult;
use crate::visual::{VisualParams, normalize_visual};

pub const FIGURE_WIDTH: u32 = 1800;
pub const FIGURE_HEIGHT: u32 = 1080;

const GRID_COLUMNS: u32 = 6;
const GRID_ROWS: u32 = 3;
const TITLE_HEIGHT: u32 = 44;
const CELL_MARGIN: u32 = 14;
const PANEL_TITLE_HEIGHT: u32 = 24;
const COLORBAR_WIDTH: u32 = 18;
const COLORBAR_GAP: u32 = 10;
/// Room right of a colour bar for its tick labels.
const COLORBAR_LABEL_WIDTH: u32 = 40;
/// Fraction of the image height covered by a colour bar.
const COLORBAR_SHRINK: f64 = 0.8;

const TITLE_SIZE: f32 = 22.0;
const PANEL_TITLE_SIZE: f32 = 15.0;
const LABEL_SIZE: f32 = 11.0;
const LEGEND_SIZE: f32 = 12.0;

pub const NDVI_RANGE: (f64, f64) = (-0.2, 1.0);
const NDVI_TICKS: [f64; 7] = [-0.2, 0.0, 0.2, 0.4, 0.6, 0.8, 1.0];
const BYTE_TICKS: [f64; 6] = [0.0, 50.0, 100.0, 150.0, 200.0, 255.0];

pub const CONTEXT_BOUNDARY: Rgb<u8> = Rgb([255, 255, 0]);
pub const PARCEL_BOUNDARY: Rgb<u8> = Rgb([255, 0, 0]);

pub const CONTEXT_UNAVAILABLE: &str = "Contexto indisponível";

pub struct FigureInput<'a> {
    pub result: &'a VegetationIndexResult,
    /// Parcel geometry in the raster CRS.
    pub parcel: &'a MultiPolygon<f64>,
    pub context: Option<&'a ContextBackground>,
    pub visual: &'a VisualParams,
    /// Heading across the top of the figure.
    pub title: &'a str,
}

/// Heading naming the parcel and when it was analysed.
pub fn figure_title(parcel: &str, at: &DateTime<Local>) -> String {
    format!(
        "Análise: {} | Data: {}",
        parcel,
        at.format("%Y-%m-%d %H:%M:%S")
    )
}

/// Value range and tick values of a colour bar.
struct BarScale {
    min: f64,
    max: f64,
    ticks: &'static [f64],
    decimals: usize,
}

const BYTE_SCALE: BarScale = BarScale {
    min: 0.0,
    max: 255.0,
    ticks: &BYTE_TICKS,
    decimals: 0,
};

const NDVI_SCALE: BarScale = BarScale {
    min: NDVI_RANGE.0,
    max: NDVI_RANGE.1,
    ticks: &NDVI_TICKS,
    decimals: 1,
};

impl BarScale {
    fn position(&self, value: f64) -> f64 {
        (value - self.min) / (self.max - self.min)
    }
}

fn cell(row: u32, col: u32, span: u32) -> Frame {
    let width = FIGURE_WIDTH / GRID_COLUMNS;
    let height = (FIGURE_HEIGHT - TITLE_HEIGHT) / GRID_ROWS;
    Frame::new(col * width, TITLE_HEIGHT + row * height, span * width, height).inset(CELL_MARGIN)
}

/// Title band, image area and colour bar strip of a band panel.
fn band_layout(frame: Frame) -> (Frame, Frame, Frame) {
    let (title, body) = frame.split_top(PANEL_TITLE_HEIGHT);
    let (main, strip) = body.split_right(COLORBAR_WIDTH + COLORBAR_LABEL_WIDTH, COLORBAR_GAP);
    (title, main, strip)
}

fn label(
    canvas: &mut RgbImage,
    typeface: Option<&Typeface>,
    text: &str,
    at: (i32, i32),
    anchor: Anchor,
    size: f32,
) {
    if let Some(typeface) = typeface {
        typeface.draw(canvas, text, at, anchor, size, TEXT_COLOR);
    }
}

pub fn render_figure(input: &FigureInput) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(FIGURE_WIDTH, FIGURE_HEIGHT, BACKGROUND);
    let typeface = Typeface::embedded();
    let typeface = typeface.as_ref();
    let result = input.result;
    let visual = input.visual;

    label(
        &mut canvas,
        typeface,
        input.title,
        ((FIGURE_WIDTH / 2) as i32, (TITLE_HEIGHT / 2) as i32),
        Anchor::Center,
        TITLE_SIZE,
    );

    let (title, body) = cell(0, 0, 4).split_top(PANEL_TITLE_HEIGHT);
    label(
        &mut canvas,
        typeface,
        "1. Mapa de Contexto (Área Total)",
        title.center(),
        Anchor::Center,
        PANEL_TITLE_SIZE,
    );
    draw_context(&mut canvas, typeface, body, input.context, input.parcel);

    let red = normalize_visual(&result.red, visual);
    let green = normalize_visual(&result.green, visual);
    let blue = normalize_visual(&result.blue, visual);
    let (_, zoom) = cell(0, 4, 2).split_top(PANEL_TITLE_HEIGHT);
    if draw_fitted(
        &mut canvas,
        &rgb_image(&red, &green, &blue),
        zoom,
        FilterType::Nearest,
    )
    .is_none()
    {
        label(
            &mut canvas,
            typeface,
            "Erro no zoom RGB",
            zoom.center(),
            Anchor::Center,
            PANEL_TITLE_SIZE,
        );
    }

    for (col, band, colormap, name) in [
        (0, &red, Colormap::Reds, "Banda Vermelha"),
        (2, &green, Colormap::Greens, "Banda Verde"),
        (4, &blue, Colormap::Blues, "Banda Azul"),
    ] {
        let image = colormap.colorize_bytes(band);
        let panel = BandPanel {
            name,
            colormap,
            scale: &BYTE_SCALE,
        };
        draw_band_panel(&mut canvas, typeface, cell(1, col, 2), &image, &panel);
    }

    let nir = Colormap::Gray.colorize_bytes(&normalize_visual(&result.nir, visual));
    let panel = BandPanel {
        name: "Banda NIR Estimada",
        colormap: Colormap::Gray,
        scale: &BYTE_SCALE,
    };
    draw_band_panel(&mut canvas, typeface, cell(2, 0, 3), &nir, &panel);

    let ndvi = Colormap::RdYlGn.colorize(&result.ndvi, NDVI_SCALE.min, NDVI_SCALE.max);
    let panel = BandPanel {
        name: "NDVI Estimado",
        colormap: Colormap::RdYlGn,
        scale: &NDVI_SCALE,
    };
    draw_band_panel(&mut canvas, typeface, cell(2, 3, 3), &ndvi, &panel);

    canvas
}

fn draw_context(
    canvas: &mut RgbImage,
    typeface: Option<&Typeface>,
    frame: Frame,
    context: Option<&ContextBackground>,
    parcel: &MultiPolygon<f64>,
) {
    let placed = context.and_then(|context| {
        draw_fitted(canvas, &context.image, frame, FilterType::Triangle)
            .map(|placed| (context, placed))
    });
    let Some((context, placed)) = placed else {
        draw_placeholder(canvas, frame);
        label(
            canvas,
            typeface,
            CONTEXT_UNAVAILABLE,
            frame.center(),
            Anchor::Center,
            PANEL_TITLE_SIZE,
        );
        return;
    };
    canvas::outline(canvas, placed, FRAME_COLOR);

    if let Some(projection) = MapProjection::new(context.extent, placed) {
        draw_boundary(canvas, &context.geometry, &projection, CONTEXT_BOUNDARY, 2);
        draw_boundary(canvas, parcel, &projection, PARCEL_BOUNDARY, 3);
    }

    if let Some(typeface) = typeface {
        draw_legend(
            canvas,
            typeface,
            placed,
            &[
                (CONTEXT_BOUNDARY, 2, "Área Total"),
                (PARCEL_BOUNDARY, 3, "Parcela"),
            ],
        );
    }
}

/// Boxed legend in the lower-left corner of `placed`.
fn draw_legend(
    canvas: &mut RgbImage,
    typeface: &Typeface,
    placed: Frame,
    entries: &[(Rgb<u8>, u32, &str)],
) {
    const PAD: u32 = 6;
    const SAMPLE: u32 = 22;
    const ROW: u32 = 18;

    let text_width = entries
        .iter()
        .map(|(_, _, text)| typeface.measure(text, LEGEND_SIZE).0)
        .max()
        .unwrap_or(0);
    let width = PAD + SAMPLE + PAD + text_width + PAD;
    let height = PAD + ROW * entries.len() as u32 + PAD / 2;
    if width + 2 * PAD > placed.width || height + 2 * PAD > placed.height {
        return;
    }

    let frame = Frame::new(
        placed.x + PAD,
        placed.y + placed.height - PAD - height,
        width,
        height,
    );
    canvas::fill(canvas, frame, BACKGROUND);
    canvas::outline(canvas, frame, FRAME_COLOR);

    for (i, (color, thickness, text)) in entries.iter().enumerate() {
        let y = (frame.y + PAD + ROW * i as u32 + ROW / 2) as f32;
        let x0 = (frame.x + PAD) as f32;
        draw_polyline(canvas, &[(x0, y), (x0 + SAMPLE as f32, y)], *color, *thickness);
        typeface.draw(
            canvas,
            text,
            ((frame.x + PAD + SAMPLE + PAD) as i32, y as i32),
            Anchor::MiddleLeft,
            LEGEND_SIZE,
            TEXT_COLOR,
        );
    }
}

struct BandPanel<'a> {
    name: &'a str,
    colormap: Colormap,
    scale: &'a BarScale,
}

fn draw_band_panel(
    canvas: &mut RgbImage,
    typeface: Option<&Typeface>,
    frame: Frame,
    image: &RgbImage,
    panel: &BandPanel,
) {
    let (title, main, strip) = band_layout(frame);
    label(
        canvas,
        typeface,
        panel.name,
        title.center(),
        Anchor::Center,
        PANEL_TITLE_SIZE,
    );

    let Some(placed) = draw_fitted(canvas, image, main, FilterType::Nearest) else {
        return;
    };

    let bar_height = ((placed.height as f64 * COLORBAR_SHRINK) as u32).max(1);
    let bar = Frame::new(
        strip.x,
        placed.y + (placed.height - bar_height) / 2,
        COLORBAR_WIDTH.min(strip.width),
        bar_height,
    );
    let scale = panel.scale;
    let ticks: Vec<f64> = scale.ticks.iter().map(|&t| scale.position(t)).collect();
    draw_colorbar(canvas, bar, panel.colormap, &ticks);

    let label_x = (bar.x + bar.width) as f32 + TICK_LENGTH + 3.0;
    for (&value, &position) in scale.ticks.iter().zip(&ticks) {
        let text = format!("{:.*}", scale.decimals, value);
        label(
            canvas,
            typeface,
            &text,
            (label_x as i32, tick_y(bar, position).round() as i32),
            Anchor::MiddleLeft,
            LABEL_SIZE,
        );
    }
}
