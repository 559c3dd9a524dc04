use serde::Deserialize;
use std::fmt::Display;

/// 1-based raster band positions of the visible channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BandIndices {
    pub blue: usize,
    pub green: usize,
    pub red: usize,
}

impl Default for BandIndices {
    fn default() -> Self {
        Self {
            blue: 1,
            green: 2,
            red: 3,
        }
    }
}

impl BandIndices {
    /// Read order used by the clipper: blue, green, red.
    pub fn as_array(&self) -> [usize; 3] {
        [self.blue, self.green, self.red]
    }

    pub fn highest(&self) -> usize {
        self.blue.max(self.green).max(self.red)
    }
}

impl Display for BandIndices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "blue: {}, green: {}, red: {}",
            self.blue, self.green, self.red
        )
    }
}
