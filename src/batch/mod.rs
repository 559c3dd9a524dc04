//! Batch processing of a directory of parcel shapefiles.

pub mod discover;
pub mod progress;
pub mod runner;

pub use discover::discover_parcels;
pub use progress::{NullProgress, ProgressCallback};
pub use runner::{BatchReport, BatchRunner, ParcelFailure};
