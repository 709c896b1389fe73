// reflekt-core/src/domain/project/mod.rs

pub mod configuration;

pub use configuration::{
    Conventions, DbtConfig, Dialect, Materialization, ProjectConfig, WarehouseConfig,
};
