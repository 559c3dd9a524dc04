use chrono::{DateTime, Local};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use super::progress::{ProgressCallback, fraction};
use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::geometry::GeometryLoader;
use crate::pipeline::{analyze_parcel, parcel_name};
use crate::plot::{self, ContextBackground, prepare_context};
use crate::readers::RasterReader;
use crate::report::{ParcelStatsRow, write_csv};

#[derive(Debug, Clone)]
pub struct ParcelFailure {
    pub parcel: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct BatchReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failures: Vec<ParcelFailure>,
    /// Figures written, in parcel order.
    pub artifacts: Vec<PathBuf>,
    pub csv_path: Option<PathBuf>,
    /// Set when the statistics table could not be written.
    pub csv_error: Option<String>,
    pub generated_at: DateTime<Local>,
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Processed {}/{} parcels at {}",
            self.succeeded,
            self.attempted,
            self.generated_at.format("%Y-%m-%d %H:%M:%S")
        )?;
        for failure in &self.failures {
            write!(f, "\n  {}: {}", failure.parcel, failure.message)?;
        }
        if let Some(path) = &self.csv_path {
            write!(f, "\nStatistics table: {}", path.display())?;
        }
        if let Some(err) = &self.csv_error {
            write!(f, "\nStatistics table not written: {}", err)?;
        }
        Ok(())
    }
}

struct ParcelOutput {
    row: ParcelStatsRow,
    /// Figure written for the parcel, or why it could not be.
    figure: Result<PathBuf>,
}

/// Runs every parcel of a directory against one raster and one context area.
pub struct BatchRunner<'a, R: ?Sized, L: ?Sized> {
    raster: &'a R,
    loader: &'a L,
    config: &'a Config,
    output_dir: PathBuf,
}

impl<'a, R, L> BatchRunner<'a, R, L>
where
    R: RasterReader + ?Sized,
    L: GeometryLoader + ?Sized,
{
    pub fn new(raster: &'a R, loader: &'a L, config: &'a Config, output_dir: PathBuf) -> Self {
        BatchRunner {
            raster,
            loader,
            config,
            output_dir,
        }
    }

    /// Figure path for a parcel: `result_<stem>.png` in the output directory.
    pub fn figure_path(&self, parcel: &Path) -> PathBuf {
        self.output_dir
            .join(format!("result_{}.png", parcel_name(parcel)))
    }

    /// Processes `parcels` in order. A failing parcel is recorded and skipped; only problems
    /// that affect every parcel (no raster CRS, unusable output directory) abort the run.
    pub fn run(
        &self,
        parcels: &[PathBuf],
        context_path: &Path,
        progress: &dyn ProgressCallback,
    ) -> Result<BatchReport> {
        self.raster.info().require_crs()?;
        fs::create_dir_all(&self.output_dir)?;

        let context = prepare_context(self.raster, self.loader, context_path, self.config);

        let total = parcels.len() as u64;
        progress.set_total(total);

        let mut report = BatchReport {
            attempted: parcels.len(),
            succeeded: 0,
            failures: Vec::new(),
            artifacts: Vec::new(),
            csv_path: None,
            csv_error: None,
            generated_at: Local::now(),
        };
        let mut rows = Vec::new();

        for (index, parcel) in parcels.iter().enumerate() {
            let name = parcel_name(parcel);
            progress.set_message(name.clone());

            match self.process_parcel(parcel, context.as_ref()) {
                Ok(output) => {
                    // Statistics do not depend on the figure being written.
                    if self.config.consolidated_csv() {
                        rows.push(output.row);
                    }
                    match output.figure {
                        Ok(figure) => {
                            report.succeeded += 1;
                            report.artifacts.push(figure);
                        }
                        Err(err) => {
                            log::warn!("Figure for parcel {} not written: {}", name, err);
                            report.failures.push(ParcelFailure {
                                parcel: name,
                                message: format!("figure not written: {}", err),
                            });
                        }
                    }
                }
                Err(err) => {
                    log::warn!("Skipping parcel {}: {}", name, err);
                    report.failures.push(ParcelFailure {
                        parcel: name,
                        message: err.to_string(),
                    });
                }
            }

            let done = index as u64 + 1;
            progress.set_position(done);
            log::info!(
                "Batch progress {:.0}% ({}/{})",
                fraction(done, total) * 100.0,
                done,
                total
            );
        }

        if !rows.is_empty() {
            let csv_path = self.output_dir.join(self.config.csv_file_name());
            match write_csv(&csv_path, &rows) {
                Ok(()) => report.csv_path = Some(csv_path),
                Err(err) => {
                    log::error!(
                        "Could not write statistics table {}: {}",
                        csv_path.display(),
                        err
                    );
                    report.csv_error = Some(err.to_string());
                }
            }
        }

        progress.finish(format!(
            "{}/{} parcels processed",
            report.succeeded, report.attempted
        ));
        log::info!(
            "Batch finished: {} of {} parcels succeeded",
            report.succeeded,
            report.attempted
        );

        Ok(report)
    }

    fn process_parcel(
        &self,
        parcel: &Path,
        context: Option<&ContextBackground>,
    ) -> Result<ParcelOutput> {
        let analysis = analyze_parcel(self.raster, self.loader, parcel, self.config)?
            .ok_or_else(|| PipelineError::GeometryOutOfBounds(parcel_name(parcel)))?;

        let row = analysis.stats_row();
        let figure = self.figure_path(parcel);
        let written = plot::save_png(&analysis.render(context, self.config), &figure);

        Ok(ParcelOutput {
            row,
            figure: written.map(|()| figure),
        })
    }
}
