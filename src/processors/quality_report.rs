/// Rows lost because the address join produced no coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinGap {
    pub unmatched_rows: usize,
    pub total_rows: usize,
}

impl JoinGap {
    pub fn ratio(&self) -> f64 {
        if self.total_rows == 0 {
            0.0
        } else {
            self.unmatched_rows as f64 / self.total_rows as f64
        }
    }
}

/// Row counts collected while a transform run cleans and joins its inputs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformReport {
    pub resale_rows: usize,

    pub raw_stations: usize,
    pub duplicate_stations: usize,
    pub planned_stations: usize,
    pub stations_after_cutoff: usize,
    pub stations_without_geodata: usize,
    pub stations: usize,

    pub raw_malls: usize,
    pub nameless_malls: usize,
    pub malls: usize,

    pub raw_addresses: usize,
    pub untrusted_addresses: usize,
    pub duplicate_addresses: usize,
    pub addresses: usize,

    pub join_gap: JoinGap,
    pub feature_rows: usize,
}

impl TransformReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a printable summary
    pub fn summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Transform Report ===\n");
        summary.push_str(&format!("Resale transactions: {}\n", self.resale_rows));

        summary.push_str(&format!(
            "\nMRT stations: {} kept of {} listed\n",
            self.stations, self.raw_stations
        ));
        summary.push_str(&format!(
            "  - duplicate line entries: {}\n",
            self.duplicate_stations
        ));
        summary.push_str(&format!(
            "  - planned (no opening date): {}\n",
            self.planned_stations
        ));
        summary.push_str(&format!(
            "  - opening after cutoff: {}\n",
            self.stations_after_cutoff
        ));
        summary.push_str(&format!(
            "  - without geodata: {}\n",
            self.stations_without_geodata
        ));

        summary.push_str(&format!(
            "\nMalls: {} from {} map entries ({} nameless)\n",
            self.malls, self.raw_malls, self.nameless_malls
        ));

        summary.push_str(&format!(
            "\nAddresses: {} kept of {} geocoded\n",
            self.addresses, self.raw_addresses
        ));
        summary.push_str(&format!(
            "  - untrusted results: {}\n",
            self.untrusted_addresses
        ));
        summary.push_str(&format!(
            "  - duplicate block/street: {}\n",
            self.duplicate_addresses
        ));

        summary.push_str(&format!(
            "\nRows with missing latitude: {} out of {} ({:.1}%)\n",
            self.join_gap.unmatched_rows,
            self.join_gap.total_rows,
            100.0 * self.join_gap.ratio()
        ));
        summary.push_str(&format!("Feature rows: {}\n", self.feature_rows));

        summary
    }
}
