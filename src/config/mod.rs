use serde::Deserialize;
use serde::Deserializer;
use serde::de::Error;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::biomass::BiomassModel;
use crate::index::NirModel;
use crate::visual::VisualParams;

pub mod error;
pub use error::ConfigError;

pub mod bands;
pub use bands::BandIndices;

const DEFAULT_BIOMASS_PERCENTILE: f64 = 25.0;
const DEFAULT_CONTEXT_MAX_SIZE: u32 = 600;
const DEFAULT_CSV_FILE_NAME: &str = "parcel_statistics.csv";

#[derive(Debug, Clone)]
pub struct Config {
    bands: BandIndices,
    nodata: Option<f64>,
    nir: NirModel,
    biomass: BiomassModel,
    biomass_percentile: f64,
    visual: VisualParams,
    context_max_size: u32,
    consolidated_csv: bool,
    csv_file_name: String,
}

// Deserializes through a helper so every field is optional and the combined values are
// validated before a Config exists.
impl<'de> Deserialize<'de> for Config {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(deny_unknown_fields)]
        struct ConfigHelper {
            bands: Option<BandIndices>,
            nodata: Option<f64>,
            nir: Option<NirModel>,
            biomass: Option<BiomassModel>,
            biomass_percentile: Option<f64>,
            visual: Option<VisualParams>,
            context_max_size: Option<u32>,
            consolidated_csv: Option<bool>,
            csv_file_name: Option<String>,
        }

        let helper = ConfigHelper::deserialize(deserializer)?;
        let defaults = Config::default();

        let config = Config {
            bands: helper.bands.unwrap_or(defaults.bands),
            nodata: helper.nodata,
            nir: helper.nir.unwrap_or(defaults.nir),
            biomass: helper.biomass.unwrap_or(defaults.biomass),
            biomass_percentile: helper
                .biomass_percentile
                .unwrap_or(defaults.biomass_percentile),
            visual: helper.visual.unwrap_or(defaults.visual),
            context_max_size: helper.context_max_size.unwrap_or(defaults.context_max_size),
            consolidated_csv: helper.consolidated_csv.unwrap_or(defaults.consolidated_csv),
            csv_file_name: helper.csv_file_name.unwrap_or(defaults.csv_file_name),
        };

        config.validate().map_err(D::Error::custom)?;

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bands: BandIndices::default(),
            nodata: None,
            nir: NirModel::default(),
            biomass: BiomassModel::default(),
            biomass_percentile: DEFAULT_BIOMASS_PERCENTILE,
            visual: VisualParams::default(),
            context_max_size: DEFAULT_CONTEXT_MAX_SIZE,
            consolidated_csv: false,
            csv_file_name: DEFAULT_CSV_FILE_NAME.to_string(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let config: Config = serde_json::from_reader(reader)?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let indices = self.bands.as_array();
        for (i, &band) in indices.iter().enumerate() {
            if band == 0 {
                return Err(ConfigError::BandIndex(band));
            }
            if indices[..i].contains(&band) {
                return Err(ConfigError::DuplicateBand(band));
            }
        }

        if self.nir.b == 0.0 {
            return Err(ConfigError::NirSlope);
        }

        check_percentile("visual.lower_percentile", self.visual.lower_percentile)?;
        check_percentile("visual.upper_percentile", self.visual.upper_percentile)?;
        check_percentile("biomass_percentile", self.biomass_percentile)?;

        if self.visual.lower_percentile >= self.visual.upper_percentile {
            return Err(ConfigError::PercentileOrder);
        }

        if self.visual.clahe_clip_limit <= 0.0 {
            return Err(ConfigError::ClipLimit(self.visual.clahe_clip_limit));
        }

        if self.context_max_size == 0 {
            return Err(ConfigError::ContextSize);
        }

        Ok(())
    }

    pub fn with_consolidated_csv(mut self, enabled: bool) -> Self {
        self.consolidated_csv = enabled;
        self
    }

    pub fn with_nodata(mut self, nodata: Option<f64>) -> Self {
        self.nodata = nodata;
        self
    }

    pub fn bands(&self) -> &BandIndices {
        &self.bands
    }

    /// Sentinel override; `None` defers to the raster's declared no-data value.
    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    pub fn nir(&self) -> &NirModel {
        &self.nir
    }

    pub fn biomass(&self) -> &BiomassModel {
        &self.biomass
    }

    pub fn biomass_percentile(&self) -> f64 {
        self.biomass_percentile
    }

    pub fn visual(&self) -> &VisualParams {
        &self.visual
    }

    pub fn context_max_size(&self) -> u32 {
        self.context_max_size
    }

    pub fn consolidated_csv(&self) -> bool {
        self.consolidated_csv
    }

    pub fn csv_file_name(&self) -> &str {
        &self.csv_file_name
    }
}

fn check_percentile(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=100.0).contains(&value) {
        return Err(ConfigError::Percentile { name, value });
    }
    Ok(())
}
