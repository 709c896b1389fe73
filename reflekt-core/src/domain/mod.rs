pub mod cdp;
pub mod dbt;
pub mod error;
pub mod naming;
pub mod plan;
pub mod ports;
pub mod project;

// Re-exports pratiques pour simplifier les imports ailleurs
pub use error::DomainError;
