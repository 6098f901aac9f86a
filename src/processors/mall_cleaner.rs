use tracing::info;
use validator::Validate;

use crate::error::Result;
use crate::models::{Mall, Table};
use crate::processors::columns::{
    coalesce_columns, drop_missing, mean_coordinates_by_name, select_columns,
};
use crate::processors::quality_report::TransformReport;

/// Cleans shopping mall geodata into one entry per named mall.
pub struct MallCleaner;

impl MallCleaner {
    pub fn new() -> Self {
        Self
    }

    pub fn clean(&self, raw: &Table, report: &mut TransformReport) -> Result<Vec<Mall>> {
        report.raw_malls = raw.len();

        // Nodes carry lat/lon directly, ways and relations only a center
        let geodata = coalesce_columns(raw, &["lat", "center.lat"], "latitude")?;
        let geodata = coalesce_columns(&geodata, &["lon", "center.lon"], "longitude")?;

        let geodata = select_columns(
            &geodata,
            &[("tags.name", "name"), ("latitude", "latitude"), ("longitude", "longitude")],
        )?;

        let named = drop_missing(&geodata, "name")?;
        report.nameless_malls = geodata.len() - named.len();

        // Some malls (e.g. Mustafa Centre) are mapped several times close together
        let malls = mean_coordinates_by_name(&named)?
            .into_iter()
            .map(|p| Mall {
                name: p.name,
                latitude: p.latitude,
                longitude: p.longitude,
            })
            .collect::<Vec<_>>();

        for mall in &malls {
            mall.validate()?;
        }

        report.malls = malls.len();
        info!("Cleaned {} malls from {} map entries", malls.len(), report.raw_malls);

        Ok(malls)
    }
}

impl Default for MallCleaner {
    fn default() -> Self {
        Self::new()
    }
}
