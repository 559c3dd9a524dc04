use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("band indices are 1-based, got {0}")]
    BandIndex(usize),

    #[error("band {0} is assigned to more than one channel")]
    DuplicateBand(usize),

    #[error("nir.b must be non-zero")]
    NirSlope,

    #[error("{name} must be within 0..=100, got {value}")]
    Percentile { name: &'static str, value: f64 },

    #[error("visual.lower_percentile must be below visual.upper_percentile")]
    PercentileOrder,

    #[error("visual.clahe_clip_limit must be positive, got {0}")]
    ClipLimit(f64),

    #[error("context_max_size must be positive")]
    ContextSize,
}
