use tracing::info;

use crate::error::Result;
use crate::models::{Address, Table, Value};
use crate::processors::columns::{drop_duplicates, select_columns};
use crate::processors::quality_report::TransformReport;

/// Minimum geocoder confidence accepted for results not typed as an address.
const MIN_CONFIDENCE: f64 = 1.0;
const ADDRESS_TYPE: &str = "address";

/// Cleans geocoded HDB block addresses.
pub struct AddressCleaner;

impl AddressCleaner {
    pub fn new() -> Self {
        Self
    }

    pub fn clean(&self, raw: &Table, report: &mut TransformReport) -> Result<Vec<Address>> {
        report.raw_addresses = raw.len();

        let trusted = remove_untrusted_entries(raw)?;
        report.untrusted_addresses = raw.len() - trusted.len();

        let unique = drop_duplicates(&trusted, &["block", "street_name"])?;
        report.duplicate_addresses = trusted.len() - unique.len();

        let projected = select_columns(
            &unique,
            &[
                ("block", "block"),
                ("street_name", "street_name"),
                ("latitude", "latitude"),
                ("longitude", "longitude"),
                ("postal_code", "postal_code"),
                ("confidence", "confidence"),
                ("type", "type"),
            ],
        )?;

        let addresses: Vec<Address> = projected
            .rows()
            .map(|row| Address {
                block: row[0].to_string(),
                street_name: row[1].to_string(),
                latitude: row[2].as_f64(),
                longitude: row[3].as_f64(),
                postal_code: optional_text(&row[4]),
                confidence: row[5].as_f64(),
                address_type: optional_text(&row[6]),
            })
            .collect();

        report.addresses = addresses.len();
        info!(
            "Cleaned {} addresses from {} geocoding results",
            addresses.len(),
            report.raw_addresses
        );

        Ok(addresses)
    }
}

impl Default for AddressCleaner {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop geocoding results that are both low-confidence and not typed as an address.
fn remove_untrusted_entries(raw: &Table) -> Result<Table> {
    let confidence_idx = raw.column_index("confidence")?;
    let type_idx = raw.column_index("type")?;

    Ok(raw.filter_rows(|row| {
        let low_confidence = row[confidence_idx]
            .as_f64()
            .is_some_and(|c| c < MIN_CONFIDENCE);
        let wrong_type = row[type_idx].as_str() != Some(ADDRESS_TYPE);
        !(low_confidence && wrong_type)
    }))
}

fn optional_text(value: &Value) -> Option<String> {
    match value {
        Value::Missing => None,
        other => Some(other.to_string()),
    }
}
