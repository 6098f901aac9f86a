use clap::Parser;
use hdb_resale_features::cli::{run, Cli};
use hdb_resale_features::error::Result;
use hdb_resale_features::utils::init_logging;

fn main() -> Result<()> {
    let cli = Cli::parse();
    // Dropping the guard flushes the log file
    let _guard = init_logging(cli.verbose, cli.log_file.as_deref())?;
    run(cli)
}
