use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Address, ResaleTransaction, Table, Value};

/// Column order of the feature table handed to the analytics step.
pub const FEATURE_COLUMNS: [&str; 21] = [
    "town",
    "block",
    "street_name",
    "storey_median",
    "floor_area_sqm",
    "room_no",
    "flat_model",
    "lease_commence_date",
    "remaining_lease_in_months",
    "resale_price",
    "latitude",
    "longitude",
    "postal_code",
    "confidence",
    "type",
    "closest_mrt",
    "distance_to_closest_mrt",
    "closest_mall",
    "distance_to_closest_mall",
    "cbd",
    "distance_to_cbd",
];

/// A resale transaction joined with its address and nearest-facility distances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub town: String,
    pub block: String,
    pub street_name: String,
    pub storey_median: i64,
    pub floor_area_sqm: f64,
    pub room_no: i64,
    pub flat_model: String,
    pub lease_commence_date: i64,
    pub remaining_lease_in_months: i64,
    pub resale_price: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub postal_code: Option<String>,
    pub confidence: Option<f64>,
    #[serde(rename = "type")]
    pub address_type: Option<String>,
    pub closest_mrt: String,
    pub distance_to_closest_mrt: f64,
    pub closest_mall: String,
    pub distance_to_closest_mall: f64,
    pub cbd: String,
    pub distance_to_cbd: f64,
}

/// A transaction whose address join produced coordinates, awaiting distance features.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedTransaction {
    pub transaction: ResaleTransaction,
    pub address: Address,
    pub latitude: f64,
    pub longitude: f64,
}

impl FeatureRow {
    pub fn values(&self) -> Vec<Value> {
        vec![
            Value::from(self.town.clone()),
            Value::from(self.block.clone()),
            Value::from(self.street_name.clone()),
            Value::Int(self.storey_median),
            Value::Float(self.floor_area_sqm),
            Value::Int(self.room_no),
            Value::from(self.flat_model.clone()),
            Value::Int(self.lease_commence_date),
            Value::Int(self.remaining_lease_in_months),
            Value::Float(self.resale_price),
            Value::Float(self.latitude),
            Value::Float(self.longitude),
            Value::from(self.postal_code.clone()),
            Value::from(self.confidence),
            Value::from(self.address_type.clone()),
            Value::from(self.closest_mrt.clone()),
            Value::Float(self.distance_to_closest_mrt),
            Value::from(self.closest_mall.clone()),
            Value::Float(self.distance_to_closest_mall),
            Value::from(self.cbd.clone()),
            Value::Float(self.distance_to_cbd),
        ]
    }

    /// Render feature rows as a [`Table`] with the canonical column order.
    pub fn to_table(rows: &[FeatureRow]) -> Result<Table> {
        let columns = FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect();
        Table::with_rows(columns, rows.iter().map(FeatureRow::values).collect())
    }
}
