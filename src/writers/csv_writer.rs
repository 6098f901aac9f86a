use std::io::Write;

use crate::error::Result;
use crate::models::{Table, Value};

/// Writes a [`Table`] as comma separated text with a header row.
pub struct CsvTableWriter;

impl CsvTableWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn write_table(&self, table: &Table) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.write_table_to(table, &mut buffer)?;
        Ok(buffer)
    }

    /// Missing cells are written as empty fields. Floats always carry a fraction
    /// (`93.0`) so they read back as floats.
    pub fn write_table_to<W: Write>(&self, table: &Table, sink: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(sink);

        writer.write_record(table.columns())?;
        for row in table.rows() {
            writer.write_record(row.iter().map(cell_text))?;
        }
        writer.flush()?;

        Ok(())
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Float(f) => format!("{:?}", f),
        other => other.to_string(),
    }
}

impl Default for CsvTableWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::feature::tests::sample_row;
    use crate::models::{FeatureRow, Value, FEATURE_COLUMNS};
    use crate::readers::CsvTableReader;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_values_are_empty_cells() {
        let table = Table::with_rows(
            vec!["name".to_string(), "confidence".to_string()],
            vec![
                vec![Value::from("a"), Value::Missing],
                vec![Value::from("b"), Value::Float(1.0)],
            ],
        )
        .unwrap();

        let bytes = CsvTableWriter::new().write_table(&table).unwrap();

        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "name,confidence\na,\nb,1.0\n"
        );
    }

    #[test]
    fn test_whole_floats_stay_floats() {
        let table = Table::with_rows(
            vec!["floor_area_sqm".to_string(), "storey_median".to_string()],
            vec![
                vec![Value::Float(93.0), Value::Int(5)],
                vec![Value::Float(0.0), Value::Int(11)],
                vec![Value::Float(1e16), Value::Int(2)],
            ],
        )
        .unwrap();

        let bytes = CsvTableWriter::new().write_table(&table).unwrap();
        let read = CsvTableReader::new().read_bytes(&bytes).unwrap();

        assert_eq!(read, table);
    }

    #[test]
    fn test_feature_table_header_order() {
        let table = FeatureRow::to_table(&[sample_row()]).unwrap();
        let bytes = CsvTableWriter::new().write_table(&table).unwrap();

        let text = String::from_utf8(bytes).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(header, FEATURE_COLUMNS.join(","));
    }

    #[test]
    fn test_read_back_keeps_text_columns() {
        let table = FeatureRow::to_table(&[sample_row()]).unwrap();
        let bytes = CsvTableWriter::new().write_table(&table).unwrap();

        let read = CsvTableReader::new().read_bytes(&bytes).unwrap();
        assert_eq!(read.columns(), table.columns());
        assert_eq!(read.column("block").unwrap(), table.column("block").unwrap());
        assert_eq!(
            read.column("postal_code").unwrap(),
            table.column("postal_code").unwrap()
        );
    }
}
