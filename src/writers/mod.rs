pub mod csv_writer;
pub mod parquet_writer;

pub use csv_writer::CsvTableWriter;
pub use parquet_writer::{feature_schema, ParquetFileInfo, ParquetWriter};
