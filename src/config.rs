use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::ValueEnum;
use config::{Config, Environment, File};
use serde::Deserialize;
use validator::Validate;

use crate::error::Result;
use crate::processors::{Facility, TransformSettings};
use crate::utils::constants::*;

/// Format of the written feature table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StorageConfig {
    pub root: PathBuf,
}

/// Input locations, relative to the storage root.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct InputConfig {
    pub resale_prices: PathBuf,
    pub mrt_stations: PathBuf,
    pub mrt_geodata: PathBuf,
    pub mall_geodata: PathBuf,
    pub address_geodata: PathBuf,

    /// Columns kept as text when reading CSV inputs
    pub text_columns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OutputConfig {
    pub directory: PathBuf,
    pub file_name: Option<PathBuf>,
    pub format: OutputFormat,

    #[validate(custom(function = "validate_compression"))]
    pub compression: String,

    #[validate(range(min = 1))]
    pub row_group_size: usize,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CbdConfig {
    #[validate(length(min = 1))]
    pub name: String,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TransformConfig {
    pub mrt_opening_cutoff: NaiveDate,

    #[validate(nested)]
    pub cbd: CbdConfig,
}

/// Settings for one pipeline run; built once and passed to the components that need them.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PipelineConfig {
    #[validate(nested)]
    pub storage: StorageConfig,

    #[validate(nested)]
    pub inputs: InputConfig,

    #[validate(nested)]
    pub output: OutputConfig,

    #[validate(nested)]
    pub transform: TransformConfig,
}

impl PipelineConfig {
    /// Load defaults, then an optional TOML file, then `HDB_PIPELINE__*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Self::defaults()?;

        builder = match path {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => {
                builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false))
            }
        };

        let config: PipelineConfig = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        let text_columns: Vec<String> = TEXT_COLUMNS.iter().map(|c| c.to_string()).collect();

        Ok(Config::builder()
            .set_default("storage.root", "local_data")?
            .set_default("inputs.resale_prices", RESALE_PRICES_FILE)?
            .set_default("inputs.mrt_stations", MRT_STATIONS_FILE)?
            .set_default("inputs.mrt_geodata", MRT_GEODATA_FILE)?
            .set_default("inputs.mall_geodata", MALL_GEODATA_FILE)?
            .set_default("inputs.address_geodata", ADDRESS_GEODATA_FILE)?
            .set_default("inputs.text_columns", text_columns)?
            .set_default("output.directory", TRANSFORMED_ANALYTICS_DIR)?
            .set_default("output.format", "csv")?
            .set_default("output.compression", COMPRESSION_SNAPPY)?
            .set_default("output.row_group_size", DEFAULT_ROW_GROUP_SIZE as u64)?
            .set_default("transform.mrt_opening_cutoff", MRT_OPENING_CUTOFF.to_string())?
            .set_default("transform.cbd.name", CBD_NAME)?
            .set_default("transform.cbd.latitude", CBD_LATITUDE)?
            .set_default("transform.cbd.longitude", CBD_LONGITUDE)?)
    }

    pub fn transform_settings(&self) -> TransformSettings {
        TransformSettings {
            mrt_opening_cutoff: self.transform.mrt_opening_cutoff,
            cbd: Facility::new(
                self.transform.cbd.name.clone(),
                self.transform.cbd.latitude,
                self.transform.cbd.longitude,
            ),
        }
    }

    /// Output path relative to the storage root; defaults to `feature_set.<format>`.
    pub fn output_path(&self) -> PathBuf {
        let file_name = self.output.file_name.clone().unwrap_or_else(|| {
            PathBuf::from(format!(
                "{}.{}",
                FEATURE_SET_STEM,
                self.output.format.extension()
            ))
        });
        self.output.directory.join(file_name)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                root: PathBuf::from("local_data"),
            },
            inputs: InputConfig {
                resale_prices: PathBuf::from(RESALE_PRICES_FILE),
                mrt_stations: PathBuf::from(MRT_STATIONS_FILE),
                mrt_geodata: PathBuf::from(MRT_GEODATA_FILE),
                mall_geodata: PathBuf::from(MALL_GEODATA_FILE),
                address_geodata: PathBuf::from(ADDRESS_GEODATA_FILE),
                text_columns: TEXT_COLUMNS.iter().map(|c| c.to_string()).collect(),
            },
            output: OutputConfig {
                directory: PathBuf::from(TRANSFORMED_ANALYTICS_DIR),
                file_name: None,
                format: OutputFormat::Csv,
                compression: COMPRESSION_SNAPPY.to_string(),
                row_group_size: DEFAULT_ROW_GROUP_SIZE,
            },
            transform: TransformConfig {
                mrt_opening_cutoff: MRT_OPENING_CUTOFF,
                cbd: CbdConfig {
                    name: CBD_NAME.to_string(),
                    latitude: CBD_LATITUDE,
                    longitude: CBD_LONGITUDE,
                },
            },
        }
    }
}

fn validate_compression(
    compression: &str,
) -> std::result::Result<(), validator::ValidationError> {
    match compression.to_lowercase().as_str() {
        COMPRESSION_SNAPPY | COMPRESSION_GZIP | COMPRESSION_LZ4 | COMPRESSION_ZSTD
        | COMPRESSION_NONE => Ok(()),
        _ => Err(validator::ValidationError::new("unsupported_compression")),
    }
}
