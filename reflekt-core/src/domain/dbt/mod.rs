// reflekt-core/src/domain/dbt/mod.rs

pub mod artifact;
pub mod columns;
pub mod sql;
pub mod table;

pub use artifact::{DocFile, ModelLayout, SourceEntry, SourceFile, identifier};
pub use columns::{CallType, ColumnMapping};
pub use sql::{ModelSql, SelectColumn};
pub use table::{TableArtifacts, TableBuilder, TableSpec};
