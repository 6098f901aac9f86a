use std::collections::{BTreeMap, HashSet};

use tracing::warn;

use crate::error::{PipelineError, Result};
use crate::models::{Table, Value, ValueKey};

/// Rename and select columns.
///
/// `mapping` pairs each source column with its output name; the result holds exactly the
/// output columns, in mapping order. Any absent source column is a
/// [`PipelineError::MissingColumn`].
pub fn select_columns(table: &Table, mapping: &[(&str, &str)]) -> Result<Table> {
    let indices = mapping
        .iter()
        .map(|(source, _)| table.column_index(source))
        .collect::<Result<Vec<_>>>()?;

    let columns = mapping.iter().map(|(_, target)| target.to_string()).collect();
    let rows = table
        .rows()
        .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
        .collect();

    Table::with_rows(columns, rows)
}

/// Add `output` holding, per row, the first non-missing value among `candidates`.
///
/// Candidates absent from the table count as missing on every row, but at least one
/// candidate must exist.
pub fn coalesce_columns(table: &Table, candidates: &[&str], output: &str) -> Result<Table> {
    let indices: Vec<usize> = candidates
        .iter()
        .filter_map(|c| table.column_index(c).ok())
        .collect();

    if indices.is_empty() {
        return Err(PipelineError::missing_column(
            &candidates.join(" | "),
            table.columns(),
        ));
    }

    let values = table
        .rows()
        .map(|row| {
            indices
                .iter()
                .map(|&i| &row[i])
                .find(|v| !v.is_missing())
                .cloned()
                .unwrap_or(Value::Missing)
        })
        .collect();

    table.with_column(output, values)
}

/// Keep the first row for every distinct combination of `keys`.
pub fn drop_duplicates(table: &Table, keys: &[&str]) -> Result<Table> {
    let indices = keys
        .iter()
        .map(|k| table.column_index(k))
        .collect::<Result<Vec<_>>>()?;

    let mut seen: HashSet<Vec<ValueKey<'_>>> = HashSet::with_capacity(table.len());
    let keep: Vec<bool> = table
        .rows()
        .map(|row| seen.insert(indices.iter().map(|&i| row[i].key()).collect()))
        .collect();

    let mut flags = keep.into_iter();
    Ok(table.filter_rows(|_| flags.next().unwrap_or(false)))
}

/// Drop rows whose `column` value is missing.
pub fn drop_missing(table: &Table, column: &str) -> Result<Table> {
    let index = table.column_index(column)?;
    Ok(table.filter_rows(|row| !row[index].is_missing()))
}

/// A named location whose coordinates are the mean of every entry sharing the name.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedPoint {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Default)]
struct CoordinateSums {
    latitude: f64,
    latitude_count: usize,
    longitude: f64,
    longitude_count: usize,
}

/// Group a `{name, latitude, longitude}` table by name and average the coordinates.
///
/// Rows without a name are ignored and missing coordinates are skipped within a group.
/// Groups come back in ascending name order; a group with no usable latitude or
/// longitude is dropped.
pub fn mean_coordinates_by_name(table: &Table) -> Result<Vec<NamedPoint>> {
    let name_idx = table.column_index("name")?;
    let lat_idx = table.column_index("latitude")?;
    let lon_idx = table.column_index("longitude")?;

    let mut groups: BTreeMap<String, CoordinateSums> = BTreeMap::new();

    for row in table.rows() {
        let name = match &row[name_idx] {
            Value::Missing => continue,
            other => other.to_string(),
        };

        let sums = groups.entry(name).or_default();
        if let Some(lat) = row[lat_idx].as_f64() {
            sums.latitude += lat;
            sums.latitude_count += 1;
        }
        if let Some(lon) = row[lon_idx].as_f64() {
            sums.longitude += lon;
            sums.longitude_count += 1;
        }
    }

    let mut points = Vec::with_capacity(groups.len());
    for (name, sums) in groups {
        if sums.latitude_count == 0 || sums.longitude_count == 0 {
            warn!("Dropping '{}': no usable coordinates", name);
            continue;
        }

        points.push(NamedPoint {
            name,
            latitude: sums.latitude / sums.latitude_count as f64,
            longitude: sums.longitude / sums.longitude_count as f64,
        });
    }

    Ok(points)
}
