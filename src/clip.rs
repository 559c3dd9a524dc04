//! Cropping raster bands to a mask geometry.
//!
//! The output window is the smallest pixel window containing the geometry's bounding box,
//! clamped to the raster. A pixel belongs to the mask when its centre lies inside the
//! geometry, with the half-open rule of GDAL rasterization for centres on the boundary: they
//! are kept on minimum-x and minimum-y edges and dropped on maximum edges. Samples outside the
//! mask, or equal to the no-data sentinel, become `NaN`.

use geo::{BoundingRect, Contains, Intersects, MultiPolygon, Point, Rect};
use ndarray::Array2;

use crate::config::BandIndices;
use crate::error::{PipelineError, Result};
use crate::extent::Extent;
use crate::readers::{GeoTransform, PixelWindow, RasterReader};

/// Sentinel used when neither the caller nor the raster declares one.
pub const DEFAULT_NODATA: f64 = 0.0;

#[derive(Debug, Clone)]
pub struct ClippedBands {
    pub red: Array2<f64>,
    pub green: Array2<f64>,
    pub blue: Array2<f64>,
    pub extent: Extent,
    pub transform: GeoTransform,
    pub window: PixelWindow,
}

#[derive(Debug, Clone)]
pub enum ClipOutcome {
    Clipped(ClippedBands),
    /// The geometry does not overlap the raster; callers skip the parcel.
    OutsideRaster,
}

impl ClipOutcome {
    pub fn into_clipped(self) -> Option<ClippedBands> {
        match self {
            ClipOutcome::Clipped(bands) => Some(bands),
            ClipOutcome::OutsideRaster => None,
        }
    }
}

/// Resolution order: explicit override, then the raster's declared value, then 0.
pub fn resolve_nodata(nodata_override: Option<f64>, declared: Option<f64>) -> f64 {
    nodata_override.or(declared).unwrap_or(DEFAULT_NODATA)
}

pub fn clip<R>(
    raster: &R,
    geometry: &MultiPolygon<f64>,
    bands: &BandIndices,
    nodata_override: Option<f64>,
) -> Result<ClipOutcome>
where
    R: RasterReader + ?Sized,
{
    let info = raster.info();
    if bands.highest() > info.band_count {
        return Err(PipelineError::BandCount {
            requested: bands.highest(),
            available: info.band_count,
        });
    }

    let Some(bounds) = geometry.bounding_rect() else {
        return Ok(ClipOutcome::OutsideRaster);
    };

    let Some(window) = geometry_window(&info.transform, info.width, info.height, &bounds) else {
        log::debug!(
            "Geometry bounds {:?} fall outside raster extent {:?}",
            bounds,
            info.extent()
        );
        return Ok(ClipOutcome::OutsideRaster);
    };

    let transform = info.transform.shifted(&window);
    let mask = pixel_mask(geometry, &transform, window.rows, window.cols);
    let sentinel = resolve_nodata(nodata_override, info.nodata);

    log::debug!(
        "Clipping window {:?} ({}), {} of {} pixels inside the geometry, sentinel {}",
        window,
        bands,
        mask.iter().filter(|&&inside| inside).count(),
        mask.len(),
        sentinel
    );

    let [blue, green, red] = bands.as_array();
    let read = |band: usize| -> Result<Array2<f64>> {
        let mut values = raster.read_window(band, &window)?;
        apply_mask(&mut values, &mask, sentinel);
        Ok(values)
    };

    Ok(ClipOutcome::Clipped(ClippedBands {
        blue: read(blue)?,
        green: read(green)?,
        red: read(red)?,
        extent: transform.extent(window.rows, window.cols),
        transform,
        window,
    }))
}

/// Pixel window covering `bounds`, or `None` when it does not overlap the raster.
fn geometry_window(
    transform: &GeoTransform,
    width: usize,
    height: usize,
    bounds: &Rect<f64>,
) -> Option<PixelWindow> {
    // Absorb float noise so a bound sitting on a pixel edge does not grab an extra column.
    let snap = |v: f64| (v * 1e6).round() / 1e6;

    let (c0, r0) = transform.to_pixel(bounds.min().x, bounds.max().y);
    let (c1, r1) = transform.to_pixel(bounds.max().x, bounds.min().y);

    let col_start = snap(c0.min(c1)).floor().max(0.0);
    let col_end = snap(c0.max(c1)).ceil().min(width as f64);
    let row_start = snap(r0.min(r1)).floor().max(0.0);
    let row_end = snap(r0.max(r1)).ceil().min(height as f64);

    if !(col_start < col_end && row_start < row_end) {
        return None;
    }

    Some(PixelWindow {
        col_off: col_start as usize,
        row_off: row_start as usize,
        cols: (col_end - col_start) as usize,
        rows: (row_end - row_start) as usize,
    })
}

fn pixel_mask(
    geometry: &MultiPolygon<f64>,
    transform: &GeoTransform,
    rows: usize,
    cols: usize,
) -> Array2<bool> {
    // Nudge applied to boundary centres, well below a pixel.
    let nudge_x = transform.pixel_width.abs() * 1e-6;
    let nudge_y = transform.pixel_height.abs() * 1e-6;

    Array2::from_shape_fn((rows, cols), |(row, col)| {
        let (x, y) = transform.pixel_center(col, row);
        let centre = Point::new(x, y);
        if geometry.contains(&centre) {
            return true;
        }
        // On the boundary: keep it when the interior lies towards +x and +y.
        geometry.intersects(&centre)
            && geometry.contains(&Point::new(x + nudge_x, y + nudge_y))
    })
}

fn apply_mask(values: &mut Array2<f64>, mask: &Array2<bool>, sentinel: f64) {
    values.zip_mut_with(mask, |v, &inside| {
        if !inside || *v == sentinel {
            *v = f64::NAN;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readers::MemoryRaster;
    use geo::polygon;
    use ndarray::Array2;

    const WKT: &str = "LOCAL_CS[\"test\"]";

    // 4x4 raster over x 0..4, y 0..4, values row * 10 + col + 1 in every band (blue offset 100).
    fn raster(nodata: Option<f64>) -> MemoryRaster {
        let base = Array2::from_shape_fn((4, 4), |(r, c)| (r * 10 + c + 1) as f64);
        MemoryRaster::new(
            vec![&base + 100.0, &base + 200.0, base],
            GeoTransform::new(0.0, 1.0, 4.0, -1.0),
            nodata,
            Some(WKT.to_string()),
        )
        .unwrap()
    }

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: x0, y: y0),
            (x: x1, y: y0),
            (x: x1, y: y1),
            (x: x0, y: y1),
            (x: x0, y: y0),
        ]])
    }

    fn clipped(outcome: ClipOutcome) -> ClippedBands {
        outcome.into_clipped().expect("geometry should overlap the raster")
    }

    #[test]
    fn test_clip_to_minimal_window() {
        let bands = clipped(
            clip(&raster(None), &square(1.0, 1.0, 3.0, 3.0), &BandIndices::default(), None)
                .unwrap(),
        );

        assert_eq!(
            bands.window,
            PixelWindow {
                col_off: 1,
                row_off: 1,
                cols: 2,
                rows: 2
            }
        );
        assert_eq!(bands.red, ndarray::array![[12.0, 13.0], [22.0, 23.0]]);
        assert_eq!(bands.green, &bands.red + 200.0);
        assert_eq!(bands.blue, &bands.red + 100.0);
        assert_eq!(bands.extent, Extent::new(1.0, 3.0, 1.0, 3.0));
    }

    #[test]
    fn test_pixels_outside_geometry_are_missing() {
        // Triangle covering the lower-left half of the raster.
        let triangle = MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 4.0, y: 0.0),
            (x: 0.0, y: 4.0),
            (x: 0.0, y: 0.0),
        ]]);

        let bands =
            clipped(clip(&raster(None), &triangle, &BandIndices::default(), None).unwrap());

        assert_eq!(bands.red.dim(), (4, 4));
        // Top-right corner centre (3.5, 3.5) is outside, bottom-left (0.5, 0.5) inside.
        assert!(bands.red[(0, 3)].is_nan());
        assert_eq!(bands.red[(3, 0)], 31.0);
        assert!(bands.green[(0, 3)].is_nan());
        assert!(bands.blue[(0, 3)].is_nan());
    }

    #[test]
    fn test_centres_on_boundary_are_half_open() {
        // Edges run through pixel centres at 0.5 and 2.5 on both axes.
        let bands = clipped(
            clip(&raster(None), &square(0.5, 0.5, 2.5, 2.5), &BandIndices::default(), None)
                .unwrap(),
        );

        assert_eq!(
            bands.window,
            PixelWindow {
                col_off: 0,
                row_off: 1,
                cols: 3,
                rows: 3
            }
        );
        // Kept: centres on the left (x = 0.5) and bottom (y = 0.5) edges.
        let expected = ndarray::array![
            [f64::NAN, f64::NAN, f64::NAN],
            [21.0, 22.0, f64::NAN],
            [31.0, 32.0, f64::NAN],
        ];
        for (got, want) in bands.red.iter().zip(expected.iter()) {
            assert_eq!(got.is_nan(), want.is_nan());
            if !want.is_nan() {
                assert_eq!(got, want);
            }
        }
        assert_eq!(crate::stats::sorted_valid(&bands.red).len(), 4);
    }

    #[test]
    fn test_default_sentinel_is_zero() {
        let mut base = Array2::from_elem((2, 2), 50.0);
        base[(0, 0)] = 0.0;
        let raster = MemoryRaster::new(
            vec![base.clone(), base.clone(), base],
            GeoTransform::new(0.0, 1.0, 2.0, -1.0),
            None,
            Some(WKT.to_string()),
        )
        .unwrap();

        let bands = clipped(
            clip(&raster, &square(0.0, 0.0, 2.0, 2.0), &BandIndices::default(), None).unwrap(),
        );

        assert!(bands.red[(0, 0)].is_nan());
        assert_eq!(bands.red[(1, 1)], 50.0);
    }

    #[test]
    fn test_declared_nodata_and_override() {
        let geometry = square(0.0, 0.0, 4.0, 4.0);

        // Red holds 11 at (1, 0) and 12 at (1, 1).
        let bands = clipped(
            clip(&raster(Some(11.0)), &geometry, &BandIndices::default(), None).unwrap(),
        );
        assert!(bands.red[(1, 0)].is_nan());
        assert_eq!(bands.red[(0, 0)], 1.0);
        assert_eq!(bands.red[(1, 1)], 12.0);

        // The override wins over the declared value.
        let bands = clipped(
            clip(&raster(Some(11.0)), &geometry, &BandIndices::default(), Some(12.0)).unwrap(),
        );
        assert_eq!(bands.red[(1, 0)], 11.0);
        assert!(bands.red[(1, 1)].is_nan());
    }

    #[test]
    fn test_resolve_nodata_precedence() {
        assert_eq!(resolve_nodata(Some(5.0), Some(7.0)), 5.0);
        assert_eq!(resolve_nodata(None, Some(7.0)), 7.0);
        assert_eq!(resolve_nodata(None, None), 0.0);
    }

    #[test]
    fn test_geometry_outside_raster() {
        let outcome = clip(
            &raster(None),
            &square(10.0, 10.0, 12.0, 12.0),
            &BandIndices::default(),
            None,
        )
        .unwrap();

        assert!(matches!(outcome, ClipOutcome::OutsideRaster));
    }

    #[test]
    fn test_empty_geometry_is_outside() {
        let outcome = clip(
            &raster(None),
            &MultiPolygon::new(Vec::new()),
            &BandIndices::default(),
            None,
        )
        .unwrap();

        assert!(matches!(outcome, ClipOutcome::OutsideRaster));
    }

    #[test]
    fn test_partial_overlap_is_clamped() {
        let bands = clipped(
            clip(&raster(None), &square(3.0, -2.0, 6.0, 1.0), &BandIndices::default(), None)
                .unwrap(),
        );

        assert_eq!(
            bands.window,
            PixelWindow {
                col_off: 3,
                row_off: 3,
                cols: 1,
                rows: 1
            }
        );
        assert_eq!(bands.red[(0, 0)], 34.0);
        assert_eq!(bands.extent, Extent::new(3.0, 4.0, 0.0, 1.0));
    }

    #[test]
    fn test_missing_band_is_an_error() {
        let bands = BandIndices {
            blue: 1,
            green: 2,
            red: 4,
        };

        let err = clip(&raster(None), &square(0.0, 0.0, 1.0, 1.0), &bands, None).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::BandCount {
                requested: 4,
                available: 3
            }
        ));
    }

    #[test]
    fn test_clip_is_idempotent() {
        let geometry = MultiPolygon::new(vec![polygon![
            (x: 0.3, y: 0.2),
            (x: 3.7, y: 1.1),
            (x: 2.2, y: 3.9),
            (x: 0.3, y: 0.2),
        ]]);
        let raster = raster(None);

        let first = clipped(clip(&raster, &geometry, &BandIndices::default(), None).unwrap());
        let second = clipped(clip(&raster, &geometry, &BandIndices::default(), None).unwrap());

        let bits = |a: &Array2<f64>| a.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&first.red), bits(&second.red));
        assert_eq!(bits(&first.green), bits(&second.green));
        assert_eq!(bits(&first.blue), bits(&second.blue));
        assert_eq!(first.extent, second.extent);
    }
}
