pub mod csv_reader;
pub mod geodata_reader;

pub use csv_reader::CsvTableReader;
pub use geodata_reader::GeodataReader;

use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::models::Table;

/// Picks a reader from the file extension.
pub struct TableReader {
    csv: CsvTableReader,
    geodata: GeodataReader,
}

impl TableReader {
    pub fn new(csv: CsvTableReader) -> Self {
        Self {
            csv,
            geodata: GeodataReader::new(),
        }
    }

    pub fn read(&self, path: &Path, bytes: &[u8]) -> Result<Table> {
        match extension(path).as_deref() {
            Some("csv") => self.csv.read_bytes(bytes),
            Some("json") => self.geodata.read_bytes(bytes),
            _ => Err(PipelineError::InvalidFormat(format!(
                "Cannot read table from '{}': expected a .csv or .json file",
                path.display()
            ))),
        }
    }
}

impl Default for TableReader {
    fn default() -> Self {
        Self::new(CsvTableReader::new())
    }
}

pub(crate) fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}
