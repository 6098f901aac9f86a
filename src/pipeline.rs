use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::{OutputFormat, PipelineConfig};
use crate::error::{PipelineError, Result};
use crate::models::FeatureRow;
use crate::processors::{FeatureAssembler, TransformInputs, TransformReport};
use crate::readers::{extension, CsvTableReader};
use crate::storage::FileStorage;
use crate::writers::ParquetWriter;

/// Result of one transform run.
#[derive(Debug, Clone)]
pub struct TransformOutcome {
    pub report: TransformReport,
    /// Location of the written feature table, relative to the storage root.
    pub output_path: PathBuf,
}

/// Reads the raw inputs from storage, builds the feature table and writes it back.
pub struct TransformPipeline {
    config: PipelineConfig,
}

impl TransformPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self, storage: &dyn FileStorage) -> Result<TransformOutcome> {
        let output_path = self.config.output_path();
        check_output_extension(&output_path, self.config.output.format)?;

        let inputs = self.load_inputs(storage)?;

        let assembler = FeatureAssembler::new(self.config.transform_settings());
        let feature_set = assembler.assemble(&inputs)?;

        if feature_set.rows.is_empty() {
            warn!("Feature table is empty; writing header only");
        }

        self.write_features(storage, &output_path, &feature_set.rows)?;
        info!(
            "Wrote {} feature rows to {}",
            feature_set.rows.len(),
            output_path.display()
        );

        Ok(TransformOutcome {
            report: feature_set.report,
            output_path,
        })
    }

    pub fn load_inputs(&self, storage: &dyn FileStorage) -> Result<TransformInputs> {
        let inputs = &self.config.inputs;
        let csv = CsvTableReader::new()
            .with_text_columns(inputs.text_columns.iter().cloned());

        let read = |path: &Path| {
            info!("Reading {}", path.display());
            storage.read_table(path, &csv)
        };

        Ok(TransformInputs {
            resale_prices: read(inputs.resale_prices.as_path())?,
            mrt_stations: read(inputs.mrt_stations.as_path())?,
            mrt_geodata: read(inputs.mrt_geodata.as_path())?,
            mall_geodata: read(inputs.mall_geodata.as_path())?,
            address_geodata: read(inputs.address_geodata.as_path())?,
        })
    }

    fn write_features(
        &self,
        storage: &dyn FileStorage,
        path: &Path,
        rows: &[FeatureRow],
    ) -> Result<()> {
        match self.config.output.format {
            OutputFormat::Csv => storage.write_table(path, &FeatureRow::to_table(rows)?),
            OutputFormat::Parquet => {
                let bytes = ParquetWriter::new()
                    .with_compression(&self.config.output.compression)?
                    .with_row_group_size(self.config.output.row_group_size)
                    .write_rows(rows)?;
                storage.write_blob(path, &bytes)
            }
        }
    }
}

fn check_output_extension(path: &Path, format: OutputFormat) -> Result<()> {
    if extension(path).as_deref() == Some(format.extension()) {
        return Ok(());
    }
    Err(PipelineError::Config(format!(
        "Output file '{}' does not match the {} output format",
        path.display(),
        format.extension()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_mismatched_output_extension() {
        let mut config = PipelineConfig::default();
        config.output.format = OutputFormat::Parquet;
        config.output.file_name = Some(PathBuf::from("features.csv"));

        let result = TransformPipeline::new(config).run(&MemoryStorage::new());
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_missing_input_is_reported() {
        let result =
            TransformPipeline::new(PipelineConfig::default()).run(&MemoryStorage::new());
        assert!(matches!(result, Err(PipelineError::MissingData(_))));
    }
}
