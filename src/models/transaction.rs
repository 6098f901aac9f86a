use serde::{Deserialize, Serialize};
use validator::Validate;

/// A cleaned HDB resale transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ResaleTransaction {
    #[validate(length(min = 1))]
    pub town: String,

    #[validate(length(min = 1))]
    pub block: String,

    #[validate(length(min = 1))]
    pub street_name: String,

    pub storey_median: i64,

    #[validate(range(min = 0.0))]
    pub floor_area_sqm: f64,

    #[validate(range(min = 1))]
    pub room_no: i64,

    pub flat_model: String,

    pub lease_commence_date: i64,

    #[validate(range(min = 0))]
    pub remaining_lease_in_months: i64,

    #[validate(range(min = 0.0))]
    pub resale_price: f64,
}

impl ResaleTransaction {
    /// Join key shared with the address geodata.
    pub fn address_key(&self) -> (&str, &str) {
        (&self.block, &self.street_name)
    }
}
