pub mod address_cleaner;
pub mod columns;
pub mod feature_assembler;
pub mod mall_cleaner;
pub mod mrt_cleaner;
pub mod nearest;
pub mod quality_report;
pub mod resale_cleaner;

pub use address_cleaner::AddressCleaner;
pub use columns::{coalesce_columns, drop_duplicates, select_columns};
pub use feature_assembler::{FeatureAssembler, FeatureSet, TransformInputs, TransformSettings};
pub use mall_cleaner::MallCleaner;
pub use mrt_cleaner::MrtStationCleaner;
pub use nearest::{nearest_facilities, Facility, FacilityIndex, NearestFacility};
pub use quality_report::{JoinGap, TransformReport};
pub use resale_cleaner::ResalePriceCleaner;
