//! Sequential and diverging colour schemes with multi-stop interpolation.

use image::{Rgb, RgbImage};
use ndarray::Array2;

/// Colour for missing samples in colormapped panels.
pub const MISSING: Rgb<u8> = Rgb([255, 255, 255]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colormap {
    Reds,
    Greens,
    Blues,
    Gray,
    /// Red, yellow, green diverging scheme used for NDVI.
    RdYlGn,
}

const REDS: &[[u8; 3]] = &[
    [255, 245, 240],
    [254, 224, 210],
    [252, 187, 161],
    [252, 146, 114],
    [251, 106, 74],
    [239, 59, 44],
    [203, 24, 29],
    [165, 15, 21],
    [103, 0, 13],
];

const GREENS: &[[u8; 3]] = &[
    [247, 252, 245],
    [229, 245, 224],
    [199, 233, 192],
    [161, 217, 155],
    [116, 196, 118],
    [65, 171, 93],
    [35, 139, 69],
    [0, 109, 44],
    [0, 68, 27],
];

const BLUES: &[[u8; 3]] = &[
    [247, 251, 255],
    [222, 235, 247],
    [198, 219, 239],
    [158, 202, 225],
    [107, 174, 214],
    [66, 146, 198],
    [33, 113, 181],
    [8, 81, 156],
    [8, 48, 107],
];

const GRAY: &[[u8; 3]] = &[[0, 0, 0], [255, 255, 255]];

const RD_YL_GN: &[[u8; 3]] = &[
    [165, 0, 38],
    [215, 48, 39],
    [244, 109, 67],
    [253, 174, 97],
    [254, 224, 139],
    [255, 255, 191],
    [217, 239, 139],
    [166, 217, 106],
    [102, 189, 99],
    [26, 152, 80],
    [0, 104, 55],
];

impl Colormap {
    fn stops(&self) -> &'static [[u8; 3]] {
        match self {
            Colormap::Reds => REDS,
            Colormap::Greens => GREENS,
            Colormap::Blues => BLUES,
            Colormap::Gray => GRAY,
            Colormap::RdYlGn => RD_YL_GN,
        }
    }

    /// Colour at `t` in `[0, 1]`; out of range positions are clamped.
    pub fn evaluate(&self, t: f64) -> Rgb<u8> {
        let stops = self.stops();
        let last = stops.len() - 1;
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let pos = t * last as f64;
        let i = (pos.floor() as usize).min(last.saturating_sub(1));
        let frac = pos - i as f64;

        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
        let (lo, hi) = (stops[i], stops[(i + 1).min(last)]);
        Rgb([lerp(lo[0], hi[0]), lerp(lo[1], hi[1]), lerp(lo[2], hi[2])])
    }

    /// Colours `values` over the `[min, max]` range; `NaN` samples get [`MISSING`].
    pub fn colorize(&self, values: &Array2<f64>, min: f64, max: f64) -> RgbImage {
        let (rows, cols) = values.dim();
        let span = if max > min { max - min } else { 1.0 };

        RgbImage::from_fn(cols as u32, rows as u32, |x, y| {
            let v = values[(y as usize, x as usize)];
            if v.is_nan() {
                MISSING
            } else {
                self.evaluate((v - min) / span)
            }
        })
    }

    pub fn colorize_bytes(&self, values: &Array2<u8>) -> RgbImage {
        let (rows, cols) = values.dim();
        RgbImage::from_fn(cols as u32, rows as u32, |x, y| {
            self.evaluate(values[(y as usize, x as usize)] as f64 / 255.0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_endpoints() {
        assert_eq!(Colormap::Gray.evaluate(0.0), Rgb([0, 0, 0]));
        assert_eq!(Colormap::Gray.evaluate(1.0), Rgb([255, 255, 255]));
        assert_eq!(Colormap::Reds.evaluate(1.0), Rgb([103, 0, 13]));
        assert_eq!(Colormap::RdYlGn.evaluate(0.5), Rgb([255, 255, 191]));
    }

    #[test]
    fn test_clamps_out_of_range() {
        assert_eq!(Colormap::Greens.evaluate(-3.0), Colormap::Greens.evaluate(0.0));
        assert_eq!(Colormap::Greens.evaluate(7.0), Colormap::Greens.evaluate(1.0));
    }

    #[test]
    fn test_gray_is_linear() {
        assert_eq!(Colormap::Gray.evaluate(0.5), Rgb([128, 128, 128]));
    }

    #[test]
    fn test_colorize_marks_missing() {
        let values = array![[-0.2, f64::NAN], [0.4, 1.0]];
        let image = Colormap::RdYlGn.colorize(&values, -0.2, 1.0);

        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(*image.get_pixel(0, 0), Rgb([165, 0, 38]));
        assert_eq!(*image.get_pixel(1, 0), MISSING);
        assert_eq!(*image.get_pixel(1, 1), Rgb([0, 104, 55]));
    }
}
