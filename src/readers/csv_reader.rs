use std::borrow::Cow;
use std::collections::HashSet;

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::models::{Table, Value};
use crate::utils::constants::TEXT_COLUMNS;

/// Reads delimited text into a [`Table`], inferring a type per cell.
#[derive(Debug, Clone)]
pub struct CsvTableReader {
    delimiter: u8,
    text_columns: HashSet<String>,
}

impl CsvTableReader {
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            text_columns: TEXT_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Columns whose cells are kept as text instead of being inferred.
    pub fn with_text_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.text_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn read_bytes(&self, bytes: &[u8]) -> Result<Table> {
        let text = decode(bytes);

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .from_reader(text.as_bytes());

        let columns: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        check_unique_headers(&columns)?;

        let as_text: Vec<bool> = columns.iter().map(|c| self.text_columns.contains(c)).collect();

        let mut table = Table::new(columns);
        for record in reader.records() {
            let record = record?;
            let row = record
                .iter()
                .zip(&as_text)
                .map(|(cell, &keep_text)| {
                    if keep_text {
                        Value::text(cell)
                    } else {
                        Value::infer(cell)
                    }
                })
                .collect();
            table.push_row(row)?;
        }

        debug!("Read {} rows with {} columns", table.len(), table.columns().len());
        Ok(table)
    }
}

impl Default for CsvTableReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode using a byte order mark when present, else UTF-8 falling back to Windows-1252.
fn decode(bytes: &[u8]) -> Cow<'_, str> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return text;
    }

    let (text, had_errors) = UTF_8.decode_without_bom_handling(bytes);
    if !had_errors {
        return text;
    }

    debug!("Input is not valid UTF-8, decoding as Windows-1252");
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
    text
}

fn check_unique_headers(columns: &[String]) -> Result<()> {
    let mut seen = HashSet::with_capacity(columns.len());
    for column in columns {
        if !seen.insert(column.as_str()) {
            return Err(PipelineError::InvalidFormat(format!(
                "Duplicate column '{}' in CSV header",
                column
            )));
        }
    }
    Ok(())
}
