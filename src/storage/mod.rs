//! Where pipeline inputs come from and where the feature table goes.
//!
//! Everything is addressed by a path relative to the storage root. Tables are
//! decoded from and encoded to blobs according to the file extension.

pub mod local;
pub mod memory;

pub use local::LocalStorage;
pub use memory::MemoryStorage;

use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::models::Table;
use crate::readers::{extension, CsvTableReader, TableReader};
use crate::writers::CsvTableWriter;

pub trait FileStorage {
    fn read_blob(&self, path: &Path) -> Result<Vec<u8>>;

    fn write_blob(&self, path: &Path, bytes: &[u8]) -> Result<()>;

    fn exists(&self, path: &Path) -> bool;

    /// Read a `.csv` or Overpass `.json` file as a table.
    fn read_table(&self, path: &Path, csv: &CsvTableReader) -> Result<Table> {
        let bytes = self.read_blob(path)?;
        let reader = TableReader::new(csv.clone());
        reader.read(path, &bytes)
    }

    /// Write a table as CSV; other extensions are rejected.
    fn write_table(&self, path: &Path, table: &Table) -> Result<()> {
        match extension(path).as_deref() {
            Some("csv") => {
                let bytes = CsvTableWriter::new().write_table(table)?;
                self.write_blob(path, &bytes)
            }
            _ => Err(PipelineError::InvalidFormat(format!(
                "Cannot write table to '{}': only .csv tables are supported",
                path.display()
            ))),
        }
    }
}
