// reflekt-core/src/infrastructure/adapters/duckdb.rs

use duckdb::{Config, Connection, params};
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::infrastructure::error::InfrastructureError;
use crate::ports::warehouse::{ColumnOracle, IntrospectionError};

const COLUMNS_QUERY: &str = "SELECT column_name \
     FROM information_schema.columns \
     WHERE lower(table_schema) = lower(?) AND lower(table_name) = lower(?) \
     ORDER BY ordinal_position";

/// Column oracle over a DuckDB database (file or in-memory).
pub struct DuckDbOracle {
    conn: Arc<Mutex<Connection>>,
}

impl DuckDbOracle {
    pub fn new(db_path: &str) -> Result<Self, InfrastructureError> {
        let config = Config::default();
        let conn = if db_path == ":memory:" {
            Connection::open_in_memory_with_flags(config)?
        } else {
            Connection::open_with_flags(db_path, config)?
        };
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    fn query_columns(&self, schema: &str, table: &str) -> Result<Vec<String>, String> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| "DuckDB Mutex Poisoned".to_string())?;
        let mut stmt = conn.prepare(COLUMNS_QUERY).map_err(|e| e.to_string())?;
        let rows = stmt
            .query_map(params![schema, table], |row| row.get::<_, String>(0))
            .map_err(|e| e.to_string())?;

        let mut columns = Vec::new();
        for row in rows {
            columns.push(row.map_err(|e| e.to_string())?);
        }
        Ok(columns)
    }
}

impl ColumnOracle for DuckDbOracle {
    fn get_columns(&self, schema: &str, table: &str) -> Result<Vec<String>, IntrospectionError> {
        debug!(schema, table, "Introspecting DuckDB table");
        let columns = self
            .query_columns(schema, table)
            .map_err(|message| IntrospectionError::Query {
                schema: schema.to_string(),
                table: table.to_string(),
                message,
            })?;

        if columns.is_empty() {
            return Err(IntrospectionError::NotFound {
                schema: schema.to_string(),
                table: table.to_string(),
            });
        }
        Ok(columns)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn oracle() -> Result<DuckDbOracle> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(
            "CREATE SCHEMA web;
             CREATE TABLE web.Cart_Viewed (id VARCHAR, cart_id VARCHAR, total DOUBLE, received_at TIMESTAMP);",
        )?;
        Ok(DuckDbOracle::from_connection(conn))
    }

    #[test]
    fn test_columns_in_table_order() -> Result<()> {
        let columns = oracle()?.get_columns("WEB", "cart_viewed")?;
        assert_eq!(columns, vec!["id", "cart_id", "total", "received_at"]);
        Ok(())
    }

    #[test]
    fn test_missing_table_is_not_found() -> Result<()> {
        let err = oracle()?.get_columns("web", "foo_bar").unwrap_err();
        assert_eq!(
            err,
            IntrospectionError::NotFound {
                schema: "web".to_string(),
                table: "foo_bar".to_string()
            }
        );
        Ok(())
    }

    #[test]
    fn test_open_in_memory() -> Result<()> {
        let oracle = DuckDbOracle::new(":memory:")?;
        assert!(oracle.get_columns("main", "nothing").is_err());
        Ok(())
    }
}
