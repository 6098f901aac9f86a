use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, info};
use validator::Validate;

use crate::error::{PipelineError, Result};
use crate::models::{MrtStation, Table, Value};
use crate::processors::columns::{
    drop_duplicates, mean_coordinates_by_name, select_columns, NamedPoint,
};
use crate::processors::quality_report::TransformReport;
use crate::utils::constants::MRT_OPENING_CUTOFF;

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%d/%m/%Y", "%d %B %Y", "%d %b %Y", "%B %d, %Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Cleans the MRT station list and places each station using map geodata.
pub struct MrtStationCleaner {
    cutoff: NaiveDate,
}

impl MrtStationCleaner {
    pub fn new(cutoff: NaiveDate) -> Self {
        Self { cutoff }
    }

    /// Produce one row per operating station, joined with its averaged map position.
    pub fn clean(
        &self,
        raw_stations: &Table,
        raw_geodata: &Table,
        report: &mut TransformReport,
    ) -> Result<Vec<MrtStation>> {
        report.raw_stations = raw_stations.len();

        let stations = select_columns(
            raw_stations,
            &[("Name", "name"), ("Code", "code"), ("Opening", "opening")],
        )?;

        // Interchanges are listed once per line
        let stations = drop_duplicates(&stations, &["name"])?;
        report.duplicate_stations = report.raw_stations - stations.len();

        let operating = self.remove_planned_stations(&stations, report)?;

        let geodata = select_columns(
            raw_geodata,
            &[("tags.name", "name"), ("lat", "latitude"), ("lon", "longitude")],
        )?;
        // Some stations are mapped as several nodes
        let positions: HashMap<String, NamedPoint> = mean_coordinates_by_name(&geodata)?
            .into_iter()
            .map(|p| (p.name.clone(), p))
            .collect();

        let mut cleaned = Vec::with_capacity(operating.len());
        for (name, code, opening) in operating {
            let Some(position) = positions.get(&name) else {
                debug!("No geodata for station '{}'", name);
                report.stations_without_geodata += 1;
                continue;
            };

            let station = MrtStation {
                no_of_lines: count_lines(&name, &code)?,
                name,
                code,
                opening,
                latitude: position.latitude,
                longitude: position.longitude,
            };
            station.validate()?;
            cleaned.push(station);
        }

        report.stations = cleaned.len();
        info!(
            "Cleaned {} MRT stations from {} listed entries",
            cleaned.len(),
            report.raw_stations
        );

        Ok(cleaned)
    }

    /// Drop stations whose opening date cannot be read (planned ones such as
    /// `mid-2034`) or falls after the cutoff.
    fn remove_planned_stations(
        &self,
        stations: &Table,
        report: &mut TransformReport,
    ) -> Result<Vec<(String, String, NaiveDate)>> {
        let name_idx = stations.column_index("name")?;
        let code_idx = stations.column_index("code")?;
        let opening_idx = stations.column_index("opening")?;

        let mut operating = Vec::with_capacity(stations.len());
        for row in stations.rows() {
            let name = row[name_idx].to_string();

            let Some(opening) = parse_opening_date(&row[opening_idx]) else {
                debug!("Excluding '{}': opening '{}' is not a date", name, row[opening_idx]);
                report.planned_stations += 1;
                continue;
            };

            if opening > self.cutoff {
                debug!("Excluding '{}': opens {}", name, opening);
                report.stations_after_cutoff += 1;
                continue;
            }

            operating.push((name, row[code_idx].to_string(), opening));
        }

        Ok(operating)
    }
}

impl Default for MrtStationCleaner {
    fn default() -> Self {
        Self::new(MRT_OPENING_CUTOFF)
    }
}

/// Interpret an opening date; `None` means the station is treated as planned.
pub fn parse_opening_date(value: &Value) -> Option<NaiveDate> {
    let raw = match value {
        Value::Missing => return None,
        other => other.to_string(),
    };
    let trimmed = raw.trim();

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Number of lines served, one code per line (e.g. `"NS1 EW24"` is two).
pub fn count_lines(name: &str, code: &str) -> Result<u32> {
    let lines = code.split_whitespace().count() as u32;
    if lines == 0 {
        return Err(PipelineError::parse(
            "code",
            code,
            format!("station '{}' has no line code", name),
        ));
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stations_table(rows: &[(&str, &str, &str)]) -> Table {
        Table::with_rows(
            vec!["Name".to_string(), "Code".to_string(), "Opening".to_string()],
            rows.iter()
                .map(|(n, c, o)| vec![Value::from(*n), Value::from(*c), Value::infer(o)])
                .collect(),
        )
        .unwrap()
    }

    fn geodata_table(rows: &[(&str, f64, f64)]) -> Table {
        Table::with_rows(
            vec![
                "type".to_string(),
                "lat".to_string(),
                "lon".to_string(),
                "tags.name".to_string(),
            ],
            rows.iter()
                .map(|(n, lat, lon)| {
                    vec![
                        Value::from("node"),
                        Value::Float(*lat),
                        Value::Float(*lon),
                        Value::from(*n),
                    ]
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_parse_opening_date() {
        let expected = NaiveDate::from_ymd_opt(1988, 11, 5);
        assert_eq!(parse_opening_date(&Value::from("1988-11-05")), expected);
        assert_eq!(parse_opening_date(&Value::from("1988-11-05 00:00:00")), expected);
        assert_eq!(parse_opening_date(&Value::from("5 November 1988")), expected);
        assert_eq!(parse_opening_date(&Value::from("mid-2034")), None);
        assert_eq!(parse_opening_date(&Value::Missing), None);
    }

    #[test]
    fn test_count_lines() {
        assert_eq!(count_lines("Jurong East", "NS1 EW24").unwrap(), 2);
        assert_eq!(count_lines("Dhoby Ghaut", "NS24  NE6 CC1").unwrap(), 3);
        assert!(count_lines("Nowhere", "   ").is_err());
    }

    #[test]
    fn test_clean_stations() {
        let stations = stations_table(&[
            ("Jurong East", "NS1 EW24", "1988-11-05"),
            ("Jurong East", "EW24", "1988-11-05"),
            ("Bukit Batok", "NS2", "1988-11-05"),
            ("Mandai Depot", "XX1", "mid-2034"),
            ("Hume", "DT4", "2025-02-28"),
            ("Orphan", "NS99", "1990-01-01"),
        ]);
        let geodata = geodata_table(&[
            ("Jurong East", 1.3330, 103.7420),
            ("Jurong East", 1.3334, 103.7424),
            ("Bukit Batok", 1.3490, 103.7496),
            ("Hume", 1.3540, 103.7690),
        ]);

        let mut report = TransformReport::new();
        let cleaned = MrtStationCleaner::default()
            .clean(&stations, &geodata, &mut report)
            .unwrap();

        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned[0].name, "Jurong East");
        assert_eq!(cleaned[0].code, "NS1 EW24");
        assert_eq!(cleaned[0].no_of_lines, 2);
        assert!((cleaned[0].latitude - 1.3332).abs() < 1e-9);
        assert!((cleaned[0].longitude - 103.7422).abs() < 1e-9);
        assert_eq!(cleaned[1].name, "Bukit Batok");

        assert_eq!(report.raw_stations, 6);
        assert_eq!(report.duplicate_stations, 1);
        assert_eq!(report.planned_stations, 1);
        assert_eq!(report.stations_after_cutoff, 1);
        assert_eq!(report.stations_without_geodata, 1);
        assert_eq!(report.stations, 2);
    }

    #[test]
    fn test_cutoff_is_inclusive() {
        let stations = stations_table(&[("Canberra", "NS12", "2019-11-02")]);
        let geodata = geodata_table(&[("Canberra", 1.443, 103.829)]);

        let cutoff = NaiveDate::from_ymd_opt(2019, 11, 2).unwrap();
        let kept = MrtStationCleaner::new(cutoff)
            .clean(&stations, &geodata, &mut TransformReport::new())
            .unwrap();
        assert_eq!(kept.len(), 1);

        let cutoff = NaiveDate::from_ymd_opt(2019, 11, 1).unwrap();
        let dropped = MrtStationCleaner::new(cutoff)
            .clean(&stations, &geodata, &mut TransformReport::new())
            .unwrap();
        assert!(dropped.is_empty());
    }

    #[test]
    fn test_missing_station_columns() {
        let stations = Table::new(vec!["Name".to_string()]);
        let geodata = geodata_table(&[]);
        let result =
            MrtStationCleaner::default().clean(&stations, &geodata, &mut TransformReport::new());
        assert!(matches!(result, Err(PipelineError::MissingColumn { .. })));
    }
}
