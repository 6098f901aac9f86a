use serde::{Deserialize, Serialize};

/// Geocoded HDB block address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub block: String,
    pub street_name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub postal_code: Option<String>,
    pub confidence: Option<f64>,
    #[serde(rename = "type")]
    pub address_type: Option<String>,
}

impl Address {
    pub fn key(&self) -> (&str, &str) {
        (&self.block, &self.street_name)
    }

    /// Both coordinates, if the geocoder produced them.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}
