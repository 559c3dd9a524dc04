/// Axis-aligned extent in raster map units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Extent {
    #[cfg(test)]
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Extent {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Extent of a `rows` x `cols` window whose upper-left corner sits at `(origin_x, origin_y)`.
    /// `pixel_height` is negative for north-up rasters.
    pub fn from_window(
        origin_x: f64,
        origin_y: f64,
        pixel_width: f64,
        pixel_height: f64,
        rows: usize,
        cols: usize,
    ) -> Self {
        let x1 = origin_x + cols as f64 * pixel_width;
        let y1 = origin_y + rows as f64 * pixel_height;

        Extent {
            min_x: origin_x.min(x1),
            max_x: origin_x.max(x1),
            min_y: origin_y.min(y1),
            max_y: origin_y.max(y1),
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}
