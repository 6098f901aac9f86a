use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::{
    Address, FeatureRow, LocatedTransaction, Mall, MrtStation, ResaleTransaction, Table,
};
use crate::processors::address_cleaner::AddressCleaner;
use crate::processors::mall_cleaner::MallCleaner;
use crate::processors::mrt_cleaner::MrtStationCleaner;
use crate::processors::nearest::{nearest_facilities, Facility, NearestFacility};
use crate::processors::quality_report::{JoinGap, TransformReport};
use crate::processors::resale_cleaner::ResalePriceCleaner;
use crate::utils::constants::{CBD_LATITUDE, CBD_LONGITUDE, CBD_NAME, MRT_OPENING_CUTOFF};

/// Raw tables consumed by one transform run.
#[derive(Debug, Clone, Default)]
pub struct TransformInputs {
    pub resale_prices: Table,
    pub mrt_stations: Table,
    pub mrt_geodata: Table,
    pub mall_geodata: Table,
    pub address_geodata: Table,
}

/// Constants of the transform that are not part of the data.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformSettings {
    pub mrt_opening_cutoff: NaiveDate,
    pub cbd: Facility,
}

impl Default for TransformSettings {
    fn default() -> Self {
        Self {
            mrt_opening_cutoff: MRT_OPENING_CUTOFF,
            cbd: Facility::new(CBD_NAME, CBD_LATITUDE, CBD_LONGITUDE),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeatureSet {
    pub rows: Vec<FeatureRow>,
    pub report: TransformReport,
}

/// Cleans every input and joins them into the feature table.
pub struct FeatureAssembler {
    settings: TransformSettings,
}

impl FeatureAssembler {
    pub fn new(settings: TransformSettings) -> Self {
        Self { settings }
    }

    pub fn assemble(&self, inputs: &TransformInputs) -> Result<FeatureSet> {
        info!("Starting transformation for analytics");
        let mut report = TransformReport::new();

        let transactions = ResalePriceCleaner::new().clean(&inputs.resale_prices, &mut report)?;
        let stations = MrtStationCleaner::new(self.settings.mrt_opening_cutoff).clean(
            &inputs.mrt_stations,
            &inputs.mrt_geodata,
            &mut report,
        )?;
        let malls = MallCleaner::new().clean(&inputs.mall_geodata, &mut report)?;
        let addresses = AddressCleaner::new().clean(&inputs.address_geodata, &mut report)?;

        let (located, join_gap) = join_addresses(transactions, &addresses);
        report.join_gap = join_gap;
        if join_gap.unmatched_rows > 0 {
            warn!(
                "Number of rows with missing latitude: {} out of {}",
                join_gap.unmatched_rows, join_gap.total_rows
            );
        }

        let rows = self.attach_distances(located, &stations, &malls)?;
        report.feature_rows = rows.len();
        info!("Assembled {} feature rows", rows.len());

        Ok(FeatureSet { rows, report })
    }

    fn attach_distances(
        &self,
        located: Vec<LocatedTransaction>,
        stations: &[MrtStation],
        malls: &[Mall],
    ) -> Result<Vec<FeatureRow>> {
        let queries: Vec<(f64, f64)> = located.iter().map(|l| (l.latitude, l.longitude)).collect();

        let station_facilities: Vec<Facility> = stations
            .iter()
            .map(|s| Facility::new(s.name.clone(), s.latitude, s.longitude))
            .collect();
        let mall_facilities: Vec<Facility> = malls
            .iter()
            .map(|m| Facility::new(m.name.clone(), m.latitude, m.longitude))
            .collect();

        let closest_mrt = nearest_or_empty(&queries, &station_facilities)?;
        let closest_mall = nearest_or_empty(&queries, &mall_facilities)?;
        let closest_cbd = nearest_or_empty(&queries, std::slice::from_ref(&self.settings.cbd))?;

        let rows = located
            .into_iter()
            .zip(closest_mrt)
            .zip(closest_mall)
            .zip(closest_cbd)
            .map(|(((l, mrt), mall), cbd)| build_feature_row(l, mrt, mall, cbd))
            .collect();

        Ok(rows)
    }
}

impl Default for FeatureAssembler {
    fn default() -> Self {
        Self::new(TransformSettings::default())
    }
}

/// Left-join transactions with addresses on (block, street_name), dropping rows
/// that end up without coordinates.
pub fn join_addresses(
    transactions: Vec<ResaleTransaction>,
    addresses: &[Address],
) -> (Vec<LocatedTransaction>, JoinGap) {
    let by_key: HashMap<(&str, &str), &Address> = addresses.iter().map(|a| (a.key(), a)).collect();

    let total_rows = transactions.len();
    let mut located = Vec::with_capacity(total_rows);

    for transaction in transactions {
        let Some(address) = by_key.get(&transaction.address_key()).copied() else {
            continue;
        };
        let Some((latitude, longitude)) = address.coordinates() else {
            continue;
        };

        located.push(LocatedTransaction {
            transaction,
            address: address.clone(),
            latitude,
            longitude,
        });
    }

    let gap = JoinGap {
        unmatched_rows: total_rows - located.len(),
        total_rows,
    };

    (located, gap)
}

fn nearest_or_empty(
    queries: &[(f64, f64)],
    facilities: &[Facility],
) -> Result<Vec<NearestFacility>> {
    // No query rows means no index is needed, even for an empty facility set
    if queries.is_empty() {
        return Ok(Vec::new());
    }
    nearest_facilities(queries, facilities)
}

fn build_feature_row(
    located: LocatedTransaction,
    mrt: NearestFacility,
    mall: NearestFacility,
    cbd: NearestFacility,
) -> FeatureRow {
    let LocatedTransaction {
        transaction: t,
        address,
        latitude,
        longitude,
    } = located;

    FeatureRow {
        town: t.town,
        block: t.block,
        street_name: t.street_name,
        storey_median: t.storey_median,
        floor_area_sqm: t.floor_area_sqm,
        room_no: t.room_no,
        flat_model: t.flat_model,
        lease_commence_date: t.lease_commence_date,
        remaining_lease_in_months: t.remaining_lease_in_months,
        resale_price: t.resale_price,
        latitude,
        longitude,
        postal_code: address.postal_code,
        confidence: address.confidence,
        address_type: address.address_type,
        closest_mrt: mrt.name,
        distance_to_closest_mrt: mrt.distance_m,
        closest_mall: mall.name,
        distance_to_closest_mall: mall.distance_m,
        cbd: cbd.name,
        distance_to_cbd: cbd.distance_m,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Value;

    fn table(columns: &[&str], rows: Vec<Vec<Value>>) -> Table {
        Table::with_rows(columns.iter().map(|c| c.to_string()).collect(), rows).unwrap()
    }

    fn transaction(block: &str) -> ResaleTransaction {
        ResaleTransaction {
            town: "BISHAN".to_string(),
            block: block.to_string(),
            street_name: "BISHAN ST 13".to_string(),
            storey_median: 5,
            floor_area_sqm: 93.0,
            room_no: 4,
            flat_model: "New Generation".to_string(),
            lease_commence_date: 1986,
            remaining_lease_in_months: 800,
            resale_price: 520000.0,
        }
    }

    fn address(block: &str, coordinates: Option<(f64, f64)>) -> Address {
        Address {
            block: block.to_string(),
            street_name: "BISHAN ST 13".to_string(),
            latitude: coordinates.map(|c| c.0),
            longitude: coordinates.map(|c| c.1),
            postal_code: Some("570100".to_string()),
            confidence: Some(1.0),
            address_type: Some("address".to_string()),
        }
    }

    fn inputs() -> TransformInputs {
        TransformInputs {
            resale_prices: table(
                &[
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
                ],
                vec![
                    vec![
                        "2017-01".into(),
                        "BISHAN".into(),
                        "4 ROOM".into(),
                        "100".into(),
                        "BISHAN ST 13".into(),
                        "04 TO 06".into(),
                        Value::Float(93.0),
                        "New Generation".into(),
                        Value::Int(1986),
                        "68 years 02 months".into(),
                        Value::Float(520000.0),
                    ],
                    vec![
                        "2017-02".into(),
                        "BISHAN".into(),
                        "5 ROOM".into(),
                        "999".into(),
                        "NOWHERE RD".into(),
                        "10 TO 12".into(),
                        Value::Float(120.0),
                        "Improved".into(),
                        Value::Int(1990),
                        Value::Int(72),
                        Value::Float(650000.0),
                    ],
                ],
            ),
            mrt_stations: table(
                &["Name", "Code", "Opening"],
                vec![
                    vec!["Bishan".into(), "NS17 CC15".into(), "1987-11-07".into()],
                    vec!["Marymount".into(), "CC16".into(), "2009-05-28".into()],
                ],
            ),
            mrt_geodata: table(
                &["lat", "lon", "tags.name"],
                vec![
                    vec![Value::Float(1.3513), Value::Float(103.8482), "Bishan".into()],
                    vec![Value::Float(1.3490), Value::Float(103.8392), "Marymount".into()],
                ],
            ),
            mall_geodata: table(
                &["lat", "lon", "center.lat", "center.lon", "tags.name"],
                vec![vec![
                    Value::Missing,
                    Value::Missing,
                    Value::Float(1.3507),
                    Value::Float(103.8488),
                    "Junction 8".into(),
                ]],
            ),
            address_geodata: table(
                &[
                    "block",
                    "street_name",
                    "latitude",
                    "longitude",
                    "postal_code",
                    "confidence",
                    "type",
                ],
                vec![vec![
                    "100".into(),
                    "BISHAN ST 13".into(),
                    Value::Float(1.3513),
                    Value::Float(103.8482),
                    "570100".into(),
                    Value::Float(1.0),
                    "address".into(),
                ]],
            ),
        }
    }

    #[test]
    fn test_join_addresses_counts_gap() {
        let transactions = vec![transaction("100"), transaction("101"), transaction("102")];
        let addresses = vec![address("100", Some((1.35, 103.85))), address("101", None)];

        let (located, gap) = join_addresses(transactions, &addresses);

        assert_eq!(located.len(), 1);
        assert_eq!(located[0].transaction.block, "100");
        assert_eq!(
            gap,
            JoinGap {
                unmatched_rows: 2,
                total_rows: 3
            }
        );
    }

    #[test]
    fn test_assemble_feature_set() {
        let feature_set = FeatureAssembler::default().assemble(&inputs()).unwrap();

        assert_eq!(feature_set.rows.len(), 1);
        let row = &feature_set.rows[0];

        assert_eq!(row.block, "100");
        assert_eq!(row.remaining_lease_in_months, 818);
        assert_eq!(row.closest_mrt, "Bishan");
        assert_eq!(row.distance_to_closest_mrt, 0.0);
        assert_eq!(row.closest_mall, "Junction 8");
        assert!(row.distance_to_closest_mall > 0.0);
        assert_eq!(row.cbd, "CBD");
        assert!(row.distance_to_cbd > 7000.0 && row.distance_to_cbd < 9000.0);
        assert_eq!(row.postal_code.as_deref(), Some("570100"));

        assert_eq!(feature_set.report.join_gap.unmatched_rows, 1);
        assert_eq!(feature_set.report.feature_rows, 1);
    }

    #[test]
    fn test_assemble_with_no_matching_addresses() {
        let mut inputs = inputs();
        inputs.address_geodata = table(
            &[
                "block",
                "street_name",
                "latitude",
                "longitude",
                "postal_code",
                "confidence",
                "type",
            ],
            vec![],
        );

        let feature_set = FeatureAssembler::default().assemble(&inputs).unwrap();

        assert!(feature_set.rows.is_empty());
        assert_eq!(feature_set.report.join_gap.unmatched_rows, 2);
    }
}
