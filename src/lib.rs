//! Vegetation index and biomass extraction for land parcels over RGB rasters.

pub mod batch;
pub mod biomass;
pub mod clip;
pub mod config;
pub mod error;
pub mod extent;
pub mod geometry;
pub mod index;
pub mod pipeline;
pub mod plot;
pub mod readers;
pub mod report;
pub mod stats;
pub mod visual;

pub use config::Config;
pub use error::{PipelineError, Result};
