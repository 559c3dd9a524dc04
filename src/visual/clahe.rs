//! Contrast limited adaptive histogram equalization over images scaled to `[0, 1]`.

use ndarray::Array2;

use crate::error::{PipelineError, Result};

const NUM_BINS: usize = 256;
/// The image is split into this many kernels along each axis.
const KERNEL_DIVISOR: usize = 8;

/// Equalizes `image` (values in `[0, 1]`) tile by tile.
///
/// `clip_limit` is relative to the number of pixels in a tile; a histogram bin never holds
/// more than `clip_limit * tile_pixels` (at least 1) counts before the excess is spread over
/// every bin. Tile mappings are blended bilinearly between tile centres.
pub fn equalize(image: &Array2<f64>, clip_limit: f64) -> Result<Array2<f64>> {
    let (rows, cols) = image.dim();
    if rows == 0 || cols == 0 {
        return Err(PipelineError::Enhancement("image has no pixels".to_string()));
    }
    if !(clip_limit.is_finite() && clip_limit > 0.0) {
        return Err(PipelineError::Enhancement(format!(
            "invalid clip limit {clip_limit}"
        )));
    }
    if let Some(bad) = image.iter().find(|v| !(0.0..=1.0).contains(*v)) {
        return Err(PipelineError::Enhancement(format!(
            "value {bad} outside the [0, 1] range"
        )));
    }

    let tile_h = (rows / KERNEL_DIVISOR).max(1);
    let tile_w = (cols / KERNEL_DIVISOR).max(1);
    let tiles_y = rows.div_ceil(tile_h);
    let tiles_x = cols.div_ceil(tile_w);

    let threshold = (clip_limit * (tile_h * tile_w) as f64).max(1.0);

    let mut mappings = Vec::with_capacity(tiles_y * tiles_x);
    for ty in 0..tiles_y {
        let r0 = ty * tile_h;
        let r1 = ((ty + 1) * tile_h).min(rows);
        for tx in 0..tiles_x {
            let c0 = tx * tile_w;
            let c1 = ((tx + 1) * tile_w).min(cols);

            let mut histogram = [0.0f64; NUM_BINS];
            for r in r0..r1 {
                for c in c0..c1 {
                    histogram[bin(image[(r, c)])] += 1.0;
                }
            }
            clip_histogram(&mut histogram, threshold);
            mappings.push(cumulative(&histogram));
        }
    }

    let mapping = |ty: usize, tx: usize, b: usize| mappings[ty * tiles_x + tx][b];

    // Position of a pixel in units of tiles, measured from the first tile centre.
    let neighbours = |pos: usize, size: usize, count: usize| -> (usize, usize, f64) {
        let f = ((pos as f64 + 0.5) / size as f64 - 0.5).max(0.0);
        let lo = (f.floor() as usize).min(count - 1);
        let hi = (lo + 1).min(count - 1);
        let weight = if hi == lo { 0.0 } else { f - lo as f64 };
        (lo, hi, weight.clamp(0.0, 1.0))
    };

    Ok(Array2::from_shape_fn((rows, cols), |(r, c)| {
        let b = bin(image[(r, c)]);
        let (ty0, ty1, dy) = neighbours(r, tile_h, tiles_y);
        let (tx0, tx1, dx) = neighbours(c, tile_w, tiles_x);

        let top = mapping(ty0, tx0, b) * (1.0 - dx) + mapping(ty0, tx1, b) * dx;
        let bottom = mapping(ty1, tx0, b) * (1.0 - dx) + mapping(ty1, tx1, b) * dx;
        top * (1.0 - dy) + bottom * dy
    }))
}

fn bin(value: f64) -> usize {
    ((value * (NUM_BINS - 1) as f64).round() as usize).min(NUM_BINS - 1)
}

fn clip_histogram(histogram: &mut [f64; NUM_BINS], threshold: f64) {
    let mut excess = 0.0;
    for count in histogram.iter_mut() {
        if *count > threshold {
            excess += *count - threshold;
            *count = threshold;
        }
    }

    let share = excess / NUM_BINS as f64;
    for count in histogram.iter_mut() {
        *count += share;
    }
}

/// Cumulative distribution scaled to `[0, 1]`.
fn cumulative(histogram: &[f64; NUM_BINS]) -> [f64; NUM_BINS] {
    let total = histogram.iter().sum::<f64>().max(f64::MIN_POSITIVE);
    let mut cdf = [0.0; NUM_BINS];
    let mut acc = 0.0;
    for (out, count) in cdf.iter_mut().zip(histogram) {
        acc += count;
        *out = (acc / total).clamp(0.0, 1.0);
    }
    cdf
}
