use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing required column '{column}' (available: {available})")]
    MissingColumn { column: String, available: String },

    #[error("Cannot parse {field} from '{value}': {reason}")]
    Parse {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Parquet write error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Missing required data: {0}")]
    MissingData(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}

impl PipelineError {
    pub fn parse(field: &str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        PipelineError::Parse {
            field: field.to_string(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn missing_column(column: &str, available: &[String]) -> Self {
        PipelineError::MissingColumn {
            column: column.to_string(),
            available: available.join(", "),
        }
    }
}
