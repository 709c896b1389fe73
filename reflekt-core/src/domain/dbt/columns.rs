// reflekt-core/src/domain/dbt/columns.rs
//
// Static column mapping: raw warehouse column -> semantic column, per call
// type. Loaded as data; the default ships with the crate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::error::DomainError;
use crate::domain::project::Dialect;

const SEGMENT_COLUMNS: &str = include_str!("../../../resources/segment_columns.yml");

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CallType {
    Identifies,
    Users,
    Groups,
    Pages,
    Screens,
    Tracks,
    /// One table per tracked event.
    Event,
}

impl CallType {
    /// Tables templated for every plan, in generation order.
    pub const STANDARD: [CallType; 6] = [
        CallType::Identifies,
        CallType::Users,
        CallType::Groups,
        CallType::Pages,
        CallType::Screens,
        CallType::Tracks,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Identifies => "identifies",
            Self::Users => "users",
            Self::Groups => "groups",
            Self::Pages => "pages",
            Self::Screens => "screens",
            Self::Tracks => "tracks",
            Self::Event => "event",
        }
    }
}

impl fmt::Display for CallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnRule {
    pub source_name: String,
    pub schema_name: String,
    pub description: String,
    pub sql: String,

    #[serde(default)]
    pub tests: Vec<String>,

    #[serde(default)]
    pub synthetic: bool,

    #[serde(default)]
    pub sql_by_dialect: BTreeMap<String, String>,
}

impl ColumnRule {
    pub fn expression(&self, dialect: Dialect) -> &str {
        self.sql_by_dialect
            .get(dialect.as_str())
            .map(String::as_str)
            .unwrap_or(&self.sql)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableMapping {
    pub description: String,
    pub unique_key: String,
    pub cluster_by: String,

    #[serde(default)]
    pub include_common: bool,

    #[serde(default)]
    pub columns: Vec<ColumnRule>,
}

/// Rules sharing one raw column, in mapping order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawColumnRules<'a> {
    pub raw: &'a str,
    pub rules: Vec<&'a ColumnRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnMapping {
    #[serde(default)]
    pub common: Vec<ColumnRule>,
    pub tables: BTreeMap<String, TableMapping>,
}

impl ColumnMapping {
    /// Mapping for Segment-loaded warehouses.
    pub fn segment() -> Result<Self, DomainError> {
        Self::from_yaml(SEGMENT_COLUMNS)
    }

    pub fn from_yaml(content: &str) -> Result<Self, DomainError> {
        let mapping: ColumnMapping = serde_yaml::from_str(content).map_err(|e| {
            DomainError::InvalidConfiguration(format!("Invalid column mapping: {}", e))
        })?;

        for call in CallType::STANDARD.iter().chain([CallType::Event].iter()) {
            if !mapping.tables.contains_key(call.key()) {
                return Err(DomainError::InvalidConfiguration(format!(
                    "Column mapping has no '{}' table",
                    call
                )));
            }
        }
        Ok(mapping)
    }

    pub fn table(&self, call: CallType) -> Result<&TableMapping, DomainError> {
        self.tables.get(call.key()).ok_or_else(|| {
            DomainError::InvalidConfiguration(format!("Column mapping has no '{}' table", call))
        })
    }

    /// `{raw_column: [rules]}` for one call type, common rules first.
    pub fn rules_for(&self, call: CallType) -> Result<Vec<RawColumnRules<'_>>, DomainError> {
        let table = self.table(call)?;
        let common: &[ColumnRule] = if table.include_common {
            self.common.as_slice()
        } else {
            &[]
        };

        let mut grouped: Vec<RawColumnRules<'_>> = Vec::new();
        for rule in common.iter().chain(table.columns.iter()) {
            match grouped.iter().position(|g| g.raw == rule.source_name) {
                Some(i) => grouped[i].rules.push(rule),
                None => grouped.push(RawColumnRules {
                    raw: &rule.source_name,
                    rules: vec![rule],
                }),
            }
        }
        Ok(grouped)
    }
}

/// Values substituted into mapping SQL and descriptions.
#[derive(Debug, Clone)]
pub struct Placeholders<'a> {
    pub schema: &'a str,
    pub table: &'a str,
    pub plan: &'a str,
    pub event: Option<&'a str>,
}

impl Placeholders<'_> {
    pub fn apply(&self, text: &str) -> String {
        text.replace("__SCHEMA_NAME__", self.schema)
            .replace("__TABLE_NAME__", self.table)
            .replace("__PLAN_NAME__", self.plan)
            .replace("__EVENT_NAME__", self.event.unwrap_or(self.table))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mapping_loads() {
        let mapping = ColumnMapping::segment().unwrap();
        let rules = mapping.rules_for(CallType::Event).unwrap();

        assert_eq!(rules[0].raw, "id");
        assert_eq!(rules[0].rules[0].schema_name, "event_id");
        assert_eq!(rules[0].rules[0].tests, vec!["not_null", "unique"]);
        assert!(rules.iter().any(|g| g.raw == "event_text"));
        assert!(rules.iter().any(|g| g.raw == "__tracking_plan" && g.rules[0].synthetic));
    }

    #[test]
    fn test_users_table_skips_common_rules() {
        let mapping = ColumnMapping::segment().unwrap();
        let rules = mapping.rules_for(CallType::Users).unwrap();
        assert_eq!(rules[0].rules[0].schema_name, "user_id");
        assert!(!rules.iter().any(|g| g.raw == "anonymous_id"));
    }

    #[test]
    fn test_rules_are_grouped_by_raw_column() {
        let mapping = ColumnMapping::from_yaml(
            r#"
common:
  - { source_name: id, schema_name: event_id, description: d, sql: id }
tables:
  identifies: { description: d, unique_key: event_id, cluster_by: tstamp, include_common: true }
  users: { description: d, unique_key: user_id, cluster_by: tstamp }
  groups: { description: d, unique_key: event_id, cluster_by: tstamp }
  pages: { description: d, unique_key: event_id, cluster_by: tstamp }
  screens: { description: d, unique_key: event_id, cluster_by: tstamp }
  tracks: { description: d, unique_key: event_id, cluster_by: tstamp }
  event:
    description: d
    unique_key: event_id
    cluster_by: tstamp
    include_common: true
    columns:
      - { source_name: id, schema_name: message_id, description: d, sql: id }
"#,
        )
        .unwrap();
        let rules = mapping.rules_for(CallType::Event).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].rules.len(), 2);
    }

    #[test]
    fn test_missing_table_is_configuration_error() {
        let err = ColumnMapping::from_yaml("tables: {}").unwrap_err();
        assert!(matches!(err, DomainError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_dialect_override_and_placeholders() {
        let mapping = ColumnMapping::segment().unwrap();
        let ts = mapping
            .common
            .iter()
            .find(|r| r.source_name == "timestamp")
            .unwrap();
        assert_eq!(ts.expression(Dialect::Redshift), "\"timestamp\"");
        assert_eq!(ts.expression(Dialect::Snowflake), "timestamp");

        let p = Placeholders {
            schema: "web",
            table: "cart_viewed",
            plan: "shop",
            event: None,
        };
        assert_eq!(p.apply("'__PLAN_NAME__' / __EVENT_NAME__"), "'shop' / cart_viewed");
    }
}
