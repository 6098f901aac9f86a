use std::path::PathBuf;

use tracing::info;
use validator::Validate;

use crate::cli::args::{Cli, Commands};
use crate::config::{OutputFormat, PipelineConfig};
use crate::error::Result;
use crate::pipeline::TransformPipeline;
use crate::storage::LocalStorage;
use crate::utils::progress::ProgressReporter;
use crate::writers::ParquetWriter;

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Transform {
            storage_root,
            output,
            format,
            compression,
        } => {
            let mut config = PipelineConfig::load(cli.config.as_deref())?;
            apply_overrides(&mut config, storage_root, output, format, compression);
            config.validate()?;

            if !cli.quiet {
                println!("Storage root: {}", config.storage.root.display());
            }

            let progress = ProgressReporter::new_spinner("Transforming resale data...", cli.quiet);
            let storage = LocalStorage::new(&config.storage.root);
            let pipeline = TransformPipeline::new(config);

            let outcome = pipeline.run(&storage)?;
            progress.finish_with_message(&format!(
                "Built {} feature rows",
                outcome.report.feature_rows
            ));

            let written = storage.resolve(&outcome.output_path);
            info!("Feature table written to {}", written.display());

            if cli.quiet {
                return Ok(());
            }

            println!("\n{}", outcome.report.summary());
            println!("Output file: {}", written.display());

            if pipeline.config().output.format == OutputFormat::Parquet {
                let file_info = ParquetWriter::new().get_file_info(&written)?;
                println!("\n{}", file_info.summary());
            }
        }

        Commands::Info { file, sample } => {
            println!("Analyzing Parquet file: {}", file.display());

            let writer = ParquetWriter::new();
            let file_info = writer.get_file_info(&file)?;

            println!("\nFile Details:");
            println!("{}", file_info.summary());

            if sample > 0 {
                println!("\nSample Records (showing up to {} records):", sample);
                match writer.read_sample_rows(&file, sample) {
                    Ok(rows) => {
                        for (i, row) in rows.iter().enumerate() {
                            println!(
                                "{}. Blk {} {} ({}): ${:.0}, {:.0} m to {}, {:.0} m to {}, {:.0} m to {}",
                                i + 1,
                                row.block,
                                row.street_name,
                                row.town,
                                row.resale_price,
                                row.distance_to_closest_mrt,
                                row.closest_mrt,
                                row.distance_to_closest_mall,
                                row.closest_mall,
                                row.distance_to_cbd,
                                row.cbd
                            );
                        }
                    }
                    Err(e) => println!("Error reading sample data: {}", e),
                }
            }
        }
    }

    Ok(())
}

/// Command line flags win over the configuration file and environment.
fn apply_overrides(
    config: &mut PipelineConfig,
    storage_root: Option<PathBuf>,
    output: Option<PathBuf>,
    format: Option<OutputFormat>,
    compression: Option<String>,
) {
    if let Some(root) = storage_root {
        config.storage.root = root;
    }
    if let Some(format) = format {
        config.output.format = format;
    }
    if let Some(output) = output {
        config.output.file_name = Some(output);
    }
    if let Some(compression) = compression {
        config.output.compression = compression;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_config_values() {
        let mut config = PipelineConfig::default();
        apply_overrides(
            &mut config,
            Some(PathBuf::from("/srv/hdb")),
            Some(PathBuf::from("features.parquet")),
            Some(OutputFormat::Parquet),
            Some("zstd".to_string()),
        );

        assert_eq!(config.storage.root, PathBuf::from("/srv/hdb"));
        assert_eq!(config.output.format, OutputFormat::Parquet);
        assert_eq!(config.output.compression, "zstd");
        assert!(config.output_path().ends_with("features.parquet"));
    }

    #[test]
    fn test_overrides_keep_unset_values() {
        let mut config = PipelineConfig::default();
        apply_overrides(&mut config, None, None, None, None);

        assert_eq!(config.output.format, OutputFormat::Csv);
        assert!(config.output.file_name.is_none());
    }
}
