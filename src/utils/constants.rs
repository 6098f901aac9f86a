use chrono::NaiveDate;

/// Mean Earth radius used to scale radian distances
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Central business district reference point
pub const CBD_NAME: &str = "CBD";
pub const CBD_LATITUDE: f64 = 1.280602347559877;
pub const CBD_LONGITUDE: f64 = 103.85040609311484;

/// Stations opening after this date are ignored
pub const MRT_OPENING_CUTOFF: NaiveDate = match NaiveDate::from_ymd_opt(2023, 5, 1) {
    Some(date) => date,
    None => panic!("invalid MRT opening cutoff"),
};

/// Input file names, relative to the storage root
pub const RESALE_PRICES_FILE: &str = "storage/resale_flat_prices.csv";
pub const MRT_STATIONS_FILE: &str = "storage/mrt_stations.csv";
pub const MRT_GEODATA_FILE: &str = "storage/mrt_geodata.json";
pub const MALL_GEODATA_FILE: &str = "storage/mall_geodata.json";
pub const ADDRESS_GEODATA_FILE: &str = "storage/address_geodata.csv";

/// Output directory, relative to the storage root
pub const TRANSFORMED_ANALYTICS_DIR: &str = "transformed_analytics";

/// File stem of the feature table read by the analytics stage
pub const FEATURE_SET_STEM: &str = "feature_set";

/// Columns read as text so identifiers keep leading zeros
pub const TEXT_COLUMNS: [&str; 2] = ["block", "postal_code"];

/// Processing defaults
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;
pub const DEFAULT_CONFIG_FILE: &str = "pipeline.toml";
pub const ENV_PREFIX: &str = "HDB_PIPELINE";

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
