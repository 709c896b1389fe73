// reflekt-core/src/infrastructure/adapters/snapshot.rs
//
// Column oracle backed by a YAML snapshot of the warehouse:
//
//   web:
//     cart_viewed: [id, cart_id, total, received_at]

use std::collections::BTreeMap;
use std::path::Path;

use crate::infrastructure::config::load_fragment;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::warehouse::{ColumnOracle, IntrospectionError};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticWarehouse {
    // schema -> table -> columns, keys lowercased
    tables: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl StaticWarehouse {
    pub fn from_file(path: &Path) -> Result<Self, InfrastructureError> {
        let raw: BTreeMap<String, BTreeMap<String, Vec<String>>> = load_fragment(path)?;
        Ok(Self::from_map(raw))
    }

    pub fn from_map(raw: BTreeMap<String, BTreeMap<String, Vec<String>>>) -> Self {
        let tables = raw
            .into_iter()
            .map(|(schema, tables)| {
                let tables = tables
                    .into_iter()
                    .map(|(table, columns)| (table.to_lowercase(), columns))
                    .collect();
                (schema.to_lowercase(), tables)
            })
            .collect();
        Self { tables }
    }

    pub fn with_table(mut self, schema: &str, table: &str, columns: &[&str]) -> Self {
        self.tables
            .entry(schema.to_lowercase())
            .or_default()
            .insert(
                table.to_lowercase(),
                columns.iter().map(|c| c.to_string()).collect(),
            );
        self
    }
}

impl ColumnOracle for StaticWarehouse {
    fn get_columns(&self, schema: &str, table: &str) -> Result<Vec<String>, IntrospectionError> {
        self.tables
            .get(&schema.to_lowercase())
            .and_then(|t| t.get(&table.to_lowercase()))
            .cloned()
            .ok_or_else(|| IntrospectionError::NotFound {
                schema: schema.to_string(),
                table: table.to_string(),
            })
    }
}
