// src/domain/ports/mod.rs

pub mod plan;

pub use plan::{PlanLoader, PlanWriter};
