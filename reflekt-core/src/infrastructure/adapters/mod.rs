pub mod duckdb;
pub mod snapshot;

pub use self::duckdb::DuckDbOracle;
pub use snapshot::StaticWarehouse;
