use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

use canopy::batch::{BatchRunner, ProgressCallback, discover_parcels};
use canopy::config::Config;
use canopy::geometry::OgrLoader;
use canopy::pipeline::{ManualRequest, run_manual};
use canopy::readers::GdalRaster;

#[derive(Parser)]
#[command(name = "canopy", about = "Estimated NDVI and biomass for land parcels")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyse a single parcel
    Manual(ManualArgs),
    /// Analyse every parcel shapefile in a directory
    Batch(BatchArgs),
}

#[derive(Args)]
struct Common {
    /// RGB raster with an embedded coordinate reference system
    #[arg(long)]
    raster: PathBuf,

    /// Vector layer outlining the whole area shown behind each parcel
    #[arg(long)]
    context: PathBuf,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// No-data value overriding the raster's own
    #[arg(long)]
    nodata: Option<f64>,
}

#[derive(Args)]
struct ManualArgs {
    #[command(flatten)]
    common: Common,

    /// Parcel vector layer
    #[arg(long)]
    parcel: PathBuf,

    /// Output figure (PNG)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Output biomass regression chart (PNG)
    #[arg(long)]
    biomass_chart: Option<PathBuf>,
}

#[derive(Args)]
struct BatchArgs {
    #[command(flatten)]
    common: Common,

    /// Directory holding the parcel shapefiles
    #[arg(long)]
    parcels: PathBuf,

    /// Directory receiving figures and the statistics table
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Write the consolidated statistics table
    #[arg(long)]
    csv: bool,
}

struct IndicatifProgress {
    bar: ProgressBar,
}

impl IndicatifProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{msg} {wide_bar:.green/dim} {pos}/{len} [{elapsed_precise}]")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-"),
        );
        Self { bar }
    }
}

impl ProgressCallback for IndicatifProgress {
    fn set_total(&self, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(0);
    }

    fn set_position(&self, pos: u64) {
        self.bar.set_position(pos);
    }

    fn set_message(&self, msg: String) {
        self.bar.set_message(msg);
    }

    fn finish(&self, msg: String) {
        self.bar.finish_with_message(msg);
    }
}

fn load_config(common: &Common) -> Result<Config, Box<dyn std::error::Error>> {
    let config = match &common.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    Ok(match common.nodata {
        Some(nodata) => config.with_nodata(Some(nodata)),
        None => config,
    })
}

fn manual(args: ManualArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&args.common)?;
    let raster = GdalRaster::open(&args.common.raster)?;

    let request = ManualRequest {
        parcel: args.parcel,
        context: args.common.context,
        output: args.output,
        biomass_chart: args.biomass_chart,
    };
    let report = run_manual(&raster, &OgrLoader, &request, &config)?;

    println!("Parcel: {}", report.parcel);
    match report.biomass {
        Some(estimate) => {
            println!(
                "NDVI p{}: {:.4}",
                config.biomass_percentile(),
                estimate.ndvi_statistic
            );
            println!("Estimated biomass: {:.2} kg/ha", estimate.biomass);
        }
        None => println!("Biomass: not available (no valid NDVI samples)"),
    }
    for path in report.figure.iter().chain(report.chart.iter()) {
        println!("Saved {}", path.display());
    }

    Ok(())
}

fn batch(args: BatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(&args.common)?;
    if args.csv {
        config = config.with_consolidated_csv(true);
    }
    let parcels = discover_parcels(&args.parcels)?;
    let raster = GdalRaster::open(&args.common.raster)?;

    let runner = BatchRunner::new(&raster, &OgrLoader, &config, args.output_dir);
    let progress = IndicatifProgress::new();
    let report = runner.run(&parcels, &args.common.context, &progress)?;

    println!("{}", report);

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();

    match Cli::parse().command {
        Command::Manual(args) => manual(args),
        Command::Batch(args) => batch(args),
    }
}
