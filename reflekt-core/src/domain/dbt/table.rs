// reflekt-core/src/domain/dbt/table.rs
//
// One templated table: source entry + staging model + doc, resolved against
// the columns the warehouse actually has.

use std::collections::HashSet;

use super::artifact::{
    DocColumn, DocFile, DocModel, ModelLayout, SourceColumn, SourceTable, identifier,
};
use super::columns::{CallType, ColumnMapping, Placeholders};
use super::sql::{ModelSql, SelectColumn, config_header};
use crate::domain::error::DomainError;
use crate::domain::naming::apply_case;
use crate::domain::plan::{Property, PropertyKind};
use crate::domain::project::{Dialect, Materialization, ProjectConfig};

/// What to template for one warehouse table.
#[derive(Debug, Clone)]
pub struct TableSpec<'a> {
    pub call: CallType,
    /// Warehouse table name (`cart_viewed`, `pages`, ...).
    pub table: String,
    /// Display name of the tracked event, for event tables.
    pub event_name: Option<String>,
    pub description: Option<String>,
    pub version: Option<u32>,
    /// Plan properties stored as extra columns of the table.
    pub properties: Vec<&'a Property>,
}

impl<'a> TableSpec<'a> {
    pub fn standard(call: CallType, properties: Vec<&'a Property>) -> Self {
        Self {
            call,
            table: call.key().to_string(),
            event_name: None,
            description: None,
            version: None,
            properties,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableArtifacts {
    pub source_table: SourceTable,
    pub layout: ModelLayout,
    pub model: ModelSql,
    pub doc: DocFile,
}

/// Resolved run settings shared by every table of a package.
pub struct TableBuilder<'a> {
    pub config: &'a ProjectConfig,
    pub mapping: &'a ColumnMapping,
    pub dialect: Dialect,
    pub materialization: Materialization,
    pub plan_name: &'a str,
    pub schema: &'a str,
    pub source_name: &'a str,
}

impl TableBuilder<'_> {
    pub fn build(
        &self,
        spec: &TableSpec<'_>,
        warehouse_columns: &[String],
    ) -> Result<TableArtifacts, DomainError> {
        let table_mapping = self.mapping.table(spec.call)?;
        let placeholders = Placeholders {
            schema: self.schema,
            table: &spec.table,
            plan: self.plan_name,
            event: spec.event_name.as_deref(),
        };
        let present: HashSet<String> = warehouse_columns.iter().map(|c| c.to_lowercase()).collect();

        let mut resolved = ResolvedColumns::default();

        // 1. Mapped columns (common + call-type specific)
        for group in self.mapping.rules_for(spec.call)? {
            let raw = group.raw.to_lowercase();
            for rule in &group.rules {
                if !rule.synthetic && !present.contains(&raw) {
                    continue;
                }
                if resolved.is_used(&rule.schema_name) {
                    continue;
                }
                let description = placeholders.apply(&rule.description);
                let tests = self
                    .config
                    .dbt()
                    .docs
                    .tests
                    .get(&rule.schema_name)
                    .cloned()
                    .unwrap_or_else(|| rule.tests.clone());

                resolved.push(
                    SelectColumn::new(placeholders.apply(rule.expression(self.dialect)), &rule.schema_name),
                    description.clone(),
                    tests,
                );
                if !rule.synthetic {
                    resolved.consume(&raw, description);
                }
            }
        }

        // 2. Plan properties, after the mapped columns
        let case = self.config.conventions.property.case;
        for prop in &spec.properties {
            for (raw, description) in flatten(prop) {
                if resolved.is_consumed(&raw) || !present.contains(&raw) {
                    continue;
                }
                let mut alias = apply_case(&raw, case);
                if alias.is_empty() {
                    alias = raw.clone();
                }
                while resolved.is_used(&alias) {
                    alias = format!("_{}", alias);
                }
                resolved.push(SelectColumn::new(&raw, alias), description.clone(), Vec::new());
                resolved.consume(&raw, description);
            }
        }

        // 3. Documents
        let description = spec
            .description
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| placeholders.apply(&table_mapping.description));
        let layout = ModelLayout::new(self.config.dbt(), self.schema, &spec.table, spec.version);

        let header = config_header(
            self.materialization,
            self.dialect,
            &table_mapping.unique_key,
            &table_mapping.cluster_by,
        );
        let incremental_logic = match self.materialization {
            Materialization::Incremental => self.config.dbt().models.incremental_logic.clone(),
            Materialization::View => None,
        };

        Ok(TableArtifacts {
            source_table: SourceTable {
                name: spec.table.clone(),
                description: description.clone(),
                columns: resolved.source_columns,
            },
            model: ModelSql {
                header,
                source_name: self.source_name.to_string(),
                table: spec.table.clone(),
                incremental_logic,
                columns: resolved.select,
            },
            doc: DocFile::new(DocModel {
                name: layout.model_name.clone(),
                description,
                columns: resolved.docs,
            }),
            layout,
        })
    }
}

#[derive(Default)]
struct ResolvedColumns {
    select: Vec<SelectColumn>,
    docs: Vec<DocColumn>,
    source_columns: Vec<SourceColumn>,
    used_aliases: HashSet<String>,
    consumed_raw: HashSet<String>,
}

impl ResolvedColumns {
    fn is_used(&self, alias: &str) -> bool {
        self.used_aliases.contains(&alias.to_lowercase())
    }

    fn is_consumed(&self, raw: &str) -> bool {
        self.consumed_raw.contains(raw)
    }

    fn push(&mut self, column: SelectColumn, description: String, tests: Vec<String>) {
        self.used_aliases.insert(column.alias.to_lowercase());
        self.docs.push(DocColumn {
            name: column.alias.clone(),
            description,
            tests,
        });
        self.select.push(column);
    }

    fn consume(&mut self, raw: &str, description: String) {
        if self.consumed_raw.insert(raw.to_string()) {
            self.source_columns.push(SourceColumn {
                name: raw.to_string(),
                description,
            });
        }
    }
}

/// Raw warehouse columns backing a property. Object members are stored as
/// `parent_child` columns; arrays stay one column.
pub fn flatten(prop: &Property) -> Vec<(String, String)> {
    let mut out = Vec::new();
    flatten_into(prop, "", &mut out);
    out
}

fn flatten_into(prop: &Property, prefix: &str, out: &mut Vec<(String, String)>) {
    let raw = format!("{}{}", prefix, identifier(prop.name()));
    match prop.kind() {
        PropertyKind::Object(members) if !members.is_empty() => {
            let prefix = format!("{}_", raw);
            for member in members {
                flatten_into(member, &prefix, out);
            }
        }
        _ => out.push((raw, prop.description().to_string())),
    }
}
