use std::collections::HashMap;

use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::models::{Table, Value};

/// Reads Overpass API responses into a flat [`Table`].
///
/// Each element becomes one row. Nested objects are flattened into dotted column
/// names (`tags.name`, `center.lat`), so nodes and ways with a centre point end up
/// side by side with missing cells where a key is absent.
#[derive(Debug, Clone)]
pub struct GeodataReader {
    separator: String,
}

impl GeodataReader {
    pub fn new() -> Self {
        Self {
            separator: ".".to_string(),
        }
    }

    pub fn read_bytes(&self, bytes: &[u8]) -> Result<Table> {
        let document: JsonValue = serde_json::from_slice(bytes)?;
        self.read_document(&document)
    }

    /// Accepts either `{"elements": [...]}` or a bare array of elements.
    pub fn read_document(&self, document: &JsonValue) -> Result<Table> {
        let elements = match document {
            JsonValue::Object(root) => match root.get("elements") {
                Some(JsonValue::Array(elements)) => elements,
                _ => {
                    return Err(PipelineError::InvalidFormat(
                        "geodata document has no 'elements' array".to_string(),
                    ))
                }
            },
            JsonValue::Array(elements) => elements,
            _ => {
                return Err(PipelineError::InvalidFormat(
                    "geodata document must be an object or an array".to_string(),
                ))
            }
        };

        let mut columns: Vec<String> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut records: Vec<Vec<(usize, Value)>> = Vec::with_capacity(elements.len());

        for (i, element) in elements.iter().enumerate() {
            let JsonValue::Object(object) = element else {
                return Err(PipelineError::InvalidFormat(format!(
                    "geodata element {} is not an object",
                    i
                )));
            };

            let mut flat = Vec::new();
            self.flatten(object, "", &mut flat);

            let record = flat
                .into_iter()
                .map(|(key, value)| {
                    let position = *positions.entry(key.clone()).or_insert_with(|| {
                        columns.push(key);
                        columns.len() - 1
                    });
                    (position, value)
                })
                .collect();
            records.push(record);
        }

        let width = columns.len();
        let mut table = Table::new(columns);
        for record in records {
            let mut row = vec![Value::Missing; width];
            for (position, value) in record {
                row[position] = value;
            }
            table.push_row(row)?;
        }

        debug!("Read {} geodata elements into {} columns", table.len(), width);
        Ok(table)
    }

    fn flatten(
        &self,
        object: &Map<String, JsonValue>,
        prefix: &str,
        out: &mut Vec<(String, Value)>,
    ) {
        for (key, value) in object {
            let name = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}{}{}", prefix, self.separator, key)
            };

            match value {
                JsonValue::Object(nested) => self.flatten(nested, &name, out),
                other => out.push((name, json_to_value(other))),
            }
        }
    }
}

impl Default for GeodataReader {
    fn default() -> Self {
        Self::new()
    }
}

fn json_to_value(value: &JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::Missing,
        JsonValue::Bool(b) => Value::Text(b.to_string()),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => n.as_f64().map(Value::Float).unwrap_or(Value::Missing),
        },
        JsonValue::String(s) => Value::Text(s.clone()),
        // Arrays are not expanded into rows
        JsonValue::Array(_) => Value::Text(value.to_string()),
        JsonValue::Object(_) => Value::Missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MALLS: &str = r#"{
        "version": 0.6,
        "elements": [
            {"type": "node", "id": 1, "lat": 1.3007, "lon": 103.8451, "tags": {"name": "ION Orchard", "shop": "mall"}},
            {"type": "way", "id": 2, "center": {"lat": 1.3507, "lon": 103.8488}, "tags": {"name": "Junction 8"}, "nodes": [10, 11]},
            {"type": "way", "id": 3, "center": {"lat": 1.32, "lon": 103.9}, "tags": {"shop": "mall"}}
        ]
    }"#;

    fn cell<'a>(table: &'a Table, row: usize, column: &str) -> &'a Value {
        &table.row(row).unwrap()[table.column_index(column).unwrap()]
    }

    #[test]
    fn test_flattens_nested_keys() {
        let table = GeodataReader::new().read_bytes(MALLS.as_bytes()).unwrap();

        assert_eq!(table.len(), 3);
        for column in [
            "lat",
            "lon",
            "center.lat",
            "center.lon",
            "tags.name",
            "tags.shop",
            "nodes",
        ] {
            assert!(table.has_column(column), "missing column {}", column);
        }

        assert_eq!(cell(&table, 0, "lat"), &Value::Float(1.3007));
        assert!(cell(&table, 0, "center.lat").is_missing());
        assert_eq!(cell(&table, 1, "center.lon"), &Value::Float(103.8488));
        assert!(cell(&table, 1, "lat").is_missing());
        assert_eq!(cell(&table, 1, "tags.name"), &Value::from("Junction 8"));
        assert!(cell(&table, 2, "tags.name").is_missing());
        assert_eq!(cell(&table, 1, "nodes"), &Value::from("[10,11]"));
        assert_eq!(cell(&table, 0, "id"), &Value::Int(1));
    }

    #[test]
    fn test_bare_array_and_empty() {
        let table = GeodataReader::new()
            .read_bytes(br#"[{"lat": 1.0, "lon": 103.0, "tags": {"name": null}}]"#)
            .unwrap();
        assert_eq!(table.len(), 1);
        assert!(cell(&table, 0, "tags.name").is_missing());

        let empty = GeodataReader::new().read_bytes(br#"{"elements": []}"#).unwrap();
        assert!(empty.is_empty());
        assert!(empty.columns().is_empty());
    }

    #[test]
    fn test_rejects_malformed_documents() {
        let reader = GeodataReader::new();
        assert!(matches!(
            reader.read_bytes(b"{\"remark\": \"timeout\"}"),
            Err(PipelineError::InvalidFormat(_))
        ));
        assert!(matches!(
            reader.read_bytes(b"[1, 2]"),
            Err(PipelineError::InvalidFormat(_))
        ));
        assert!(matches!(
            reader.read_bytes(b"not json"),
            Err(PipelineError::Json(_))
        ));
    }
}
