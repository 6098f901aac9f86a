pub mod address;
pub mod feature;
pub mod mall;
pub mod station;
pub mod table;
pub mod transaction;

pub use address::Address;
pub use feature::{FeatureRow, LocatedTransaction, FEATURE_COLUMNS};
pub use mall::Mall;
pub use station::MrtStation;
pub use table::{Table, Value, ValueKey};
pub use transaction::ResaleTransaction;
