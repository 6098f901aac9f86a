use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::{PipelineError, Result};

/// Install the global subscriber: console output plus an optional plain-text log file.
///
/// The returned guard flushes the file writer when dropped, so keep it alive for the
/// whole run.
pub fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let default_level = if verbose { "debug" } else { "info" };
    let directive = format!("hdb_resale_features={}", default_level);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&directive))
        .map_err(|e| PipelineError::Config(format!("Invalid log filter: {}", e)))?;

    let console_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            std::fs::create_dir_all(directory)?;
            let file_name = path
                .file_name()
                .ok_or_else(|| {
                    PipelineError::Config(format!("Invalid log file path: {}", path.display()))
                })?;

            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| PipelineError::Config(format!("Logging already initialised: {}", e)))?;

    Ok(guard)
}
