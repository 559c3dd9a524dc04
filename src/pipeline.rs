//! Single-parcel analysis, shared by the manual command and the batch runner.

use chrono::Local;
use geo::MultiPolygon;
use std::path::{Path, PathBuf};

use crate::biomass::{BiomassEstimate, estimate_for_index};
use crate::clip::clip;
use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::geometry::{GeometryLoader, load_for_raster};
use crate::index::{VegetationIndexResult, derive};
use crate::plot::{self, ContextBackground, FigureInput, figure_title, prepare_context};
use crate::readers::RasterReader;
use crate::report::ParcelStatsRow;

/// A parcel clipped from the raster with its derived bands.
#[derive(Debug, Clone)]
pub struct ParcelAnalysis {
    pub name: String,
    /// Parcel geometry in the raster CRS.
    pub geometry: MultiPolygon<f64>,
    pub result: VegetationIndexResult,
}

impl ParcelAnalysis {
    pub fn stats_row(&self) -> ParcelStatsRow {
        ParcelStatsRow::from_result(&self.name, &self.result)
    }

    pub fn render(&self, context: Option<&ContextBackground>, config: &Config) -> image::RgbImage {
        let title = figure_title(&self.name, &Local::now());
        plot::render_figure(&FigureInput {
            result: &self.result,
            parcel: &self.geometry,
            context,
            visual: config.visual(),
            title: &title,
        })
    }
}

/// Identifier of a parcel file: its name without extension.
pub fn parcel_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Loads, clips and derives one parcel. `Ok(None)` when the parcel does not overlap the raster.
pub fn analyze_parcel<R, L>(
    raster: &R,
    loader: &L,
    path: &Path,
    config: &Config,
) -> Result<Option<ParcelAnalysis>>
where
    R: RasterReader + ?Sized,
    L: GeometryLoader + ?Sized,
{
    let geometry = load_for_raster(loader, raster, path)?;

    let Some(bands) = clip(raster, &geometry, config.bands(), config.nodata())?.into_clipped()
    else {
        return Ok(None);
    };

    let result = derive(&bands, config.nir());
    Ok(Some(ParcelAnalysis {
        name: parcel_name(path),
        geometry,
        result,
    }))
}

#[derive(Debug, Clone)]
pub struct ManualRequest {
    pub parcel: PathBuf,
    pub context: PathBuf,
    /// Figure destination; nothing is written when absent.
    pub output: Option<PathBuf>,
    pub biomass_chart: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ManualReport {
    pub parcel: String,
    pub stats: ParcelStatsRow,
    /// `None` when the parcel has no valid NDVI sample.
    pub biomass: Option<BiomassEstimate>,
    pub figure: Option<PathBuf>,
    pub chart: Option<PathBuf>,
}

/// Full analysis of one parcel. Unlike a batch run, every failure is returned to the caller.
pub fn run_manual<R, L>(
    raster: &R,
    loader: &L,
    request: &ManualRequest,
    config: &Config,
) -> Result<ManualReport>
where
    R: RasterReader + ?Sized,
    L: GeometryLoader + ?Sized,
{
    raster.info().require_crs()?;

    let context = prepare_context(raster, loader, &request.context, config);

    let analysis = analyze_parcel(raster, loader, &request.parcel, config)?
        .ok_or_else(|| PipelineError::GeometryOutOfBounds(parcel_name(&request.parcel)))?;
    log::info!("Analysing parcel {}", analysis.name);

    let figure = match &request.output {
        Some(path) => {
            plot::save_png(&analysis.render(context.as_ref(), config), path)?;
            Some(path.clone())
        }
        None => None,
    };

    let biomass = match estimate_for_index(
        &analysis.result,
        config.biomass(),
        config.biomass_percentile(),
    ) {
        Ok(estimate) => Some(estimate),
        Err(PipelineError::InsufficientData { required, found }) => {
            log::warn!(
                "No biomass for {}: {} valid NDVI sample(s), {} required",
                analysis.name,
                found,
                required
            );
            None
        }
        Err(err) => return Err(err),
    };

    let chart = match (&request.biomass_chart, &biomass) {
        (Some(path), Some(estimate)) => {
            let image = plot::render_biomass_chart(config.biomass(), estimate, &analysis.name);
            plot::save_png(&image, path)?;
            Some(path.clone())
        }
        _ => None,
    };

    Ok(ManualReport {
        parcel: analysis.name.clone(),
        stats: analysis.stats_row(),
        biomass,
        figure,
        chart,
    })
}
