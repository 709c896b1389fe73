// reflekt-core/src/ports/warehouse.rs

// What the templater needs from a warehouse: the raw columns of one table.
// Adapters decide how (live connection, static snapshot...).

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IntrospectionError {
    #[error("Table '{schema}.{table}' not found in the warehouse")]
    NotFound { schema: String, table: String },

    #[error("Warehouse query failed for '{schema}.{table}': {message}")]
    Query {
        schema: String,
        table: String,
        message: String,
    },
}

pub trait ColumnOracle: Send + Sync {
    /// Raw column names of `schema.table`, in warehouse order.
    fn get_columns(&self, schema: &str, table: &str) -> Result<Vec<String>, IntrospectionError>;
}
