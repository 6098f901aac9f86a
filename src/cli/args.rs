use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::OutputFormat;

#[derive(Parser)]
#[command(name = "hdb-resale-features")]
#[command(about = "Build the HDB resale price feature table from raw transactions and geodata")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Suppress progress output and the report")]
    pub quiet: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(
        short,
        long,
        global = true,
        help = "Configuration file [default: pipeline.toml if present]"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clean the raw inputs and write the feature table
    Transform {
        #[arg(long, help = "Directory holding the storage/ inputs")]
        storage_root: Option<PathBuf>,

        #[arg(
            short,
            long,
            help = "Output file name inside the output directory [default: feature_set.{csv|parquet}]"
        )]
        output: Option<PathBuf>,

        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        #[arg(long, help = "Parquet compression: snappy, gzip, lz4, zstd or none")]
        compression: Option<String>,
    },

    /// Display information about a Parquet feature file
    Info {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long, default_value = "10")]
        sample: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_transform() {
        let cli = Cli::parse_from([
            "hdb-resale-features",
            "--quiet",
            "transform",
            "--storage-root",
            "/data",
            "--format",
            "parquet",
        ]);

        assert!(cli.quiet);
        match cli.command {
            Commands::Transform {
                storage_root,
                format,
                output,
                compression,
            } => {
                assert_eq!(storage_root, Some(PathBuf::from("/data")));
                assert_eq!(format, Some(OutputFormat::Parquet));
                assert!(output.is_none());
                assert!(compression.is_none());
            }
            Commands::Info { .. } => panic!("expected transform"),
        }
    }
}
