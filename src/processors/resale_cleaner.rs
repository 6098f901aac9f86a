use chrono::{Datelike, NaiveDate};
use tracing::info;
use validator::Validate;

use crate::error::{PipelineError, Result};
use crate::models::{ResaleTransaction, Table, Value};
use crate::processors::quality_report::TransformReport;

const MONTHS_PER_YEAR: i64 = 12;
const OUT_OF_RANGE: &str = "value out of range";

/// Flat types without a leading room count, both treated as six rooms.
const SIX_ROOM_FLAT_TYPES: [&str; 2] = ["EXECUTIVE", "MULTI-GENERATION"];

/// Turns raw resale-flat-price rows into typed [`ResaleTransaction`]s.
pub struct ResalePriceCleaner;

impl ResalePriceCleaner {
    pub fn new() -> Self {
        Self
    }

    /// Derive remaining lease, storey median and room count for every row.
    ///
    /// Any malformed lease, storey range or flat type aborts with a
    /// [`PipelineError::Parse`].
    pub fn clean(
        &self,
        raw: &Table,
        report: &mut TransformReport,
    ) -> Result<Vec<ResaleTransaction>> {
        let columns = ResaleColumns::resolve(raw)?;
        let mut transactions = Vec::with_capacity(raw.len());

        for row in raw.rows() {
            transactions.push(self.clean_row(row, &columns)?);
        }

        report.resale_rows = transactions.len();
        info!("Cleaned {} resale transactions", transactions.len());

        Ok(transactions)
    }

    fn clean_row(&self, row: &[Value], columns: &ResaleColumns) -> Result<ResaleTransaction> {
        let lease_commence_date =
            required_i64(&row[columns.lease_commence_date], "lease_commence_date")?;

        let remaining_lease = columns
            .remaining_lease
            .map(|i| &row[i])
            .unwrap_or(&Value::Missing);

        let remaining_lease_in_months = match remaining_lease {
            Value::Missing => {
                let resale_year = parse_resale_year(&row[columns.month])?;
                calculate_remaining_lease(lease_commence_date, resale_year)?
            }
            Value::Text(duration) => parse_duration_string(duration)?,
            other => {
                let years = other.as_i64().ok_or_else(|| {
                    PipelineError::parse(
                        "remaining_lease",
                        other.to_string(),
                        "not a whole number of years",
                    )
                })?;
                parse_duration_years(years)?
            }
        };

        let storey_range = required_text(&row[columns.storey_range], "storey_range")?;
        let flat_type = required_text(&row[columns.flat_type], "flat_type")?;

        let transaction = ResaleTransaction {
            town: required_text(&row[columns.town], "town")?,
            block: required_text(&row[columns.block], "block")?,
            street_name: required_text(&row[columns.street_name], "street_name")?,
            storey_median: calculate_storey_median(&storey_range)?,
            floor_area_sqm: required_f64(&row[columns.floor_area_sqm], "floor_area_sqm")?,
            room_no: parse_rooms(&flat_type)?,
            flat_model: required_text(&row[columns.flat_model], "flat_model")?,
            lease_commence_date,
            remaining_lease_in_months,
            resale_price: required_f64(&row[columns.resale_price], "resale_price")?,
        };

        transaction.validate()?;
        Ok(transaction)
    }
}

impl Default for ResalePriceCleaner {
    fn default() -> Self {
        Self::new()
    }
}

/// Column positions in the raw resale table.
struct ResaleColumns {
    month: usize,
    town: usize,
    flat_type: usize,
    block: usize,
    street_name: usize,
    storey_range: usize,
    floor_area_sqm: usize,
    flat_model: usize,
    lease_commence_date: usize,
    remaining_lease: Option<usize>,
    resale_price: usize,
}

impl ResaleColumns {
    fn resolve(raw: &Table) -> Result<Self> {
        Ok(Self {
            month: raw.column_index("month")?,
            town: raw.column_index("town")?,
            flat_type: raw.column_index("flat_type")?,
            block: raw.column_index("block")?,
            street_name: raw.column_index("street_name")?,
            storey_range: raw.column_index("storey_range")?,
            floor_area_sqm: raw.column_index("floor_area_sqm")?,
            flat_model: raw.column_index("flat_model")?,
            lease_commence_date: raw.column_index("lease_commence_date")?,
            // Datasets before 2015 carry no remaining lease at all
            remaining_lease: raw.column_index("remaining_lease").ok(),
            resale_price: raw.column_index("resale_price")?,
        })
    }
}

/// Parse a lease duration such as `"56 years 09 months"` or `"63 years"` into months.
pub fn parse_duration_string(duration: &str) -> Result<i64> {
    let parts: Vec<&str> = duration.split_whitespace().collect();

    let years = parts
        .first()
        .and_then(|p| p.parse::<i64>().ok())
        .ok_or_else(|| {
            PipelineError::parse(
                "remaining_lease",
                duration,
                "expected '<years> years [<months> months]'",
            )
        })?;

    let months = match parts.get(2) {
        Some(p) => p.parse::<i64>().map_err(|_| {
            PipelineError::parse(
                "remaining_lease",
                duration,
                format!("invalid month count '{}'", p),
            )
        })?,
        None => 0,
    };

    years
        .checked_mul(MONTHS_PER_YEAR)
        .and_then(|total| total.checked_add(months))
        .ok_or_else(|| PipelineError::parse("remaining_lease", duration, OUT_OF_RANGE))
}

pub fn parse_duration_years(years: i64) -> Result<i64> {
    years
        .checked_mul(MONTHS_PER_YEAR)
        .ok_or_else(|| PipelineError::parse("remaining_lease", years.to_string(), OUT_OF_RANGE))
}

/// Lease months derived from the commencement year and the resale year; months are
/// ignored because the commencement date only carries a year.
pub fn calculate_remaining_lease(lease_commence_date: i64, resale_year: i64) -> Result<i64> {
    resale_year
        .checked_sub(lease_commence_date)
        .and_then(|years| years.checked_mul(MONTHS_PER_YEAR))
        .ok_or_else(|| {
            PipelineError::parse(
                "lease_commence_date",
                lease_commence_date.to_string(),
                OUT_OF_RANGE,
            )
        })
}

/// Year of the transaction date (`YYYY-MM`, `YYYY-MM-DD` or `DD/MM/YYYY`).
pub fn parse_resale_year(value: &Value) -> Result<i64> {
    let raw = value.to_string();
    let trimmed = raw.trim();

    let date = NaiveDate::parse_from_str(&format!("{}-01", trimmed), "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"))
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%d/%m/%Y"))
        .map_err(|_| PipelineError::parse("month", trimmed, "unrecognised transaction date"))?;

    Ok(date.year() as i64)
}

/// Integer midpoint of a storey range such as `"10 TO 12"`.
pub fn calculate_storey_median(storey_range: &str) -> Result<i64> {
    let bounds: Vec<&str> = storey_range.split("TO").map(str::trim).collect();

    if bounds.len() != 2 {
        return Err(PipelineError::parse(
            "storey_range",
            storey_range,
            "expected '<lower> TO <upper>'",
        ));
    }

    let bound = |text: &str, which: &str| {
        text.parse::<i64>().map_err(|_| {
            PipelineError::parse(
                "storey_range",
                storey_range,
                format!("{} bound is not an integer", which),
            )
        })
    };
    let lower = bound(bounds[0], "lower")?;
    let upper = bound(bounds[1], "upper")?;

    lower
        .checked_add(upper)
        .map(|sum| sum.div_euclid(2))
        .ok_or_else(|| PipelineError::parse("storey_range", storey_range, OUT_OF_RANGE))
}

/// Room count from a flat type label such as `"3 ROOM"`.
pub fn parse_rooms(flat_type: &str) -> Result<i64> {
    let label = flat_type.trim();

    // Executive flats have five rooms plus a study
    if SIX_ROOM_FLAT_TYPES.contains(&label) {
        return Ok(6);
    }

    label
        .split_whitespace()
        .next()
        .and_then(|token| token.parse::<i64>().ok())
        .ok_or_else(|| PipelineError::parse("flat_type", flat_type, "no leading room count"))
}

fn required_text(value: &Value, field: &str) -> Result<String> {
    match value {
        Value::Missing => Err(PipelineError::parse(field, "", "missing value")),
        other => Ok(other.to_string()),
    }
}

fn required_f64(value: &Value, field: &str) -> Result<f64> {
    match value {
        Value::Missing => Err(PipelineError::parse(field, "", "missing value")),
        other => other
            .as_f64()
            .ok_or_else(|| PipelineError::parse(field, other.to_string(), "not a number")),
    }
}

fn required_i64(value: &Value, field: &str) -> Result<i64> {
    match value {
        Value::Missing => Err(PipelineError::parse(field, "", "missing value")),
        other => other
            .as_i64()
            .ok_or_else(|| PipelineError::parse(field, other.to_string(), "not an integer")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: [&str; 11] = [
        "month",
        "town",
        "flat_type",
        "block",
        "street_name",
        "storey_range",
        "floor_area_sqm",
        "flat_model",
        "lease_commence_date",
        "remaining_lease",
        "resale_price",
    ];

    fn raw_row(flat_type: &str, storey_range: &str, remaining_lease: Value) -> Vec<Value> {
        vec![
            Value::from("2017-01"),
            Value::from("ANG MO KIO"),
            Value::from(flat_type),
            Value::from("406"),
            Value::from("ANG MO KIO AVE 10"),
            Value::from(storey_range),
            Value::Float(44.0),
            Value::from("Improved"),
            Value::Int(1979),
            remaining_lease,
            Value::Float(232000.0),
        ]
    }

    fn raw_table(rows: Vec<Vec<Value>>) -> Table {
        Table::with_rows(COLUMNS.iter().map(|c| c.to_string()).collect(), rows).unwrap()
    }

    #[test]
    fn test_parse_duration_string() {
        assert_eq!(parse_duration_string("56 years 09 months").unwrap(), 681);
        assert_eq!(parse_duration_string("63 years").unwrap(), 756);
        assert!(parse_duration_string("sixty years").is_err());
        assert!(parse_duration_string("").is_err());
    }

    #[test]
    fn test_parse_duration_years() {
        assert_eq!(parse_duration_years(63).unwrap(), 756);
        assert!(matches!(
            parse_duration_years(i64::MAX / 6),
            Err(PipelineError::Parse { .. })
        ));
    }

    #[test]
    fn test_oversized_numbers_are_parse_errors() {
        let huge_storeys = "9223372036854775807 TO 9223372036854775807";
        match calculate_storey_median(huge_storeys) {
            Err(PipelineError::Parse { field, value, .. }) => {
                assert_eq!(field, "storey_range");
                assert_eq!(value, huge_storeys);
            }
            other => panic!("expected a storey_range parse error, got {:?}", other),
        }

        assert!(matches!(
            parse_duration_string("922337203685477580 years"),
            Err(PipelineError::Parse { .. })
        ));
        assert!(matches!(
            parse_duration_string("768614336404564650 years 11 months"),
            Err(PipelineError::Parse { .. })
        ));
        assert!(matches!(
            calculate_remaining_lease(i64::MIN, 2017),
            Err(PipelineError::Parse { .. })
        ));
        assert!(matches!(
            calculate_remaining_lease(1979, i64::MAX),
            Err(PipelineError::Parse { .. })
        ));
    }

    #[test]
    fn test_clean_rejects_oversized_lease_years() {
        let raw = raw_table(vec![raw_row("3 ROOM", "01 TO 03", Value::Int(i64::MAX))]);
        let result = ResalePriceCleaner::new().clean(&raw, &mut TransformReport::new());
        assert!(matches!(result, Err(PipelineError::Parse { .. })));
    }

    #[test]
    fn test_calculate_remaining_lease_from_dates() {
        assert_eq!(parse_resale_year(&Value::from("2017-01")).unwrap(), 2017);
        assert_eq!(parse_resale_year(&Value::from("15/03/2016")).unwrap(), 2016);
        assert!(parse_resale_year(&Value::from("March 2016")).is_err());
        assert_eq!(calculate_remaining_lease(1979, 2017).unwrap(), 456);
    }

    #[test]
    fn test_calculate_storey_median() {
        assert_eq!(calculate_storey_median("10 TO 12").unwrap(), 11);
        assert_eq!(calculate_storey_median("01 TO 03").unwrap(), 2);
        assert_eq!(calculate_storey_median("01 TO 05").unwrap(), 3);
        assert!(calculate_storey_median("10 - 12").is_err());
        assert!(calculate_storey_median("10 TO 12 TO 14").is_err());
        assert!(calculate_storey_median("XX TO 12").is_err());
    }

    #[test]
    fn test_parse_rooms() {
        assert_eq!(parse_rooms("3 ROOM").unwrap(), 3);
        assert_eq!(parse_rooms("EXECUTIVE").unwrap(), 6);
        assert_eq!(parse_rooms("MULTI-GENERATION").unwrap(), 6);
        assert!(matches!(parse_rooms("STUDIO"), Err(PipelineError::Parse { .. })));
    }

    #[test]
    fn test_clean_handles_each_lease_encoding() {
        let raw = raw_table(vec![
            raw_row("2 ROOM", "10 TO 12", Value::from("61 years 04 months")),
            raw_row("3 ROOM", "01 TO 03", Value::Int(63)),
            raw_row("EXECUTIVE", "04 TO 06", Value::Missing),
        ]);

        let mut report = TransformReport::new();
        let cleaned = ResalePriceCleaner::new().clean(&raw, &mut report).unwrap();

        assert_eq!(report.resale_rows, 3);
        assert_eq!(cleaned[0].remaining_lease_in_months, 736);
        assert_eq!(cleaned[0].storey_median, 11);
        assert_eq!(cleaned[0].room_no, 2);
        assert_eq!(cleaned[1].remaining_lease_in_months, 756);
        assert_eq!(cleaned[1].storey_median, 2);
        assert_eq!(cleaned[2].remaining_lease_in_months, (2017 - 1979) * 12);
        assert_eq!(cleaned[2].room_no, 6);
        assert_eq!(cleaned[2].block, "406");
    }

    #[test]
    fn test_clean_without_remaining_lease_column() {
        let columns: Vec<String> = COLUMNS
            .iter()
            .filter(|c| **c != "remaining_lease")
            .map(|c| c.to_string())
            .collect();
        let mut row = raw_row("4 ROOM", "07 TO 09", Value::Missing);
        row.remove(9);
        let raw = Table::with_rows(columns, vec![row]).unwrap();

        let cleaned = ResalePriceCleaner::new()
            .clean(&raw, &mut TransformReport::new())
            .unwrap();

        assert_eq!(cleaned[0].remaining_lease_in_months, 456);
    }

    #[test]
    fn test_clean_propagates_parse_errors() {
        let raw = raw_table(vec![raw_row("3 ROOM", "HIGH FLOOR", Value::Int(63))]);
        let result = ResalePriceCleaner::new().clean(&raw, &mut TransformReport::new());
        assert!(matches!(result, Err(PipelineError::Parse { .. })));
    }

    #[test]
    fn test_clean_requires_columns() {
        let raw = Table::new(vec!["town".to_string()]);
        let result = ResalePriceCleaner::new().clean(&raw, &mut TransformReport::new());
        assert!(matches!(result, Err(PipelineError::MissingColumn { .. })));
    }
}
