// reflekt-core/src/lib.rs

// 1. Documentation
#![allow(missing_docs)]
// 2. Memory safety
#![deny(unsafe_code)]
// 3. Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// 4. Performance
#![warn(clippy::perf)]

// --- HEXAGONAL MODULES ---

// 1. Ports: what the core expects from a warehouse.
pub mod ports;

// 2. Domain: plans, naming rules, CDP dialects, dbt artifacts.
// Depends on nothing else in the crate.
pub mod domain;

// 3. Infrastructure: config files, plan files, DuckDB, Jinja, package staging.
pub mod infrastructure;

// 4. Application: lint, dbt templating, CDP push/pull.
pub mod application;

// --- ERRORS ---
pub mod error;

pub use error::ReflektError;
