// reflekt-core/src/domain/project/configuration.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::domain::error::DomainError;
use crate::domain::naming::{NameCase, NamingRule};
use crate::domain::plan::metadata::MetadataSchema;
use crate::domain::plan::property::DataType;

/// Warehouse family targeted by the generated SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Snowflake,
    Redshift,
    DuckDb,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Snowflake => "snowflake",
            Self::Redshift => "redshift",
            Self::DuckDb => "duckdb",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "snowflake" => Ok(Self::Snowflake),
            "redshift" => Ok(Self::Redshift),
            "duckdb" => Ok(Self::DuckDb),
            other => Err(DomainError::InvalidConfiguration(format!(
                "Unknown warehouse type '{}' (expected snowflake, redshift or duckdb)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Materialization {
    View,
    Incremental,
}

impl FromStr for Materialization {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "view" => Ok(Self::View),
            "incremental" => Ok(Self::Incremental),
            other => Err(DomainError::InvalidConfiguration(format!(
                "Invalid materialized mode '{}' (expected view or incremental)",
                other
            ))),
        }
    }
}

// --- CONVENTIONS ---

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Conventions {
    #[serde(default = "default_event_rule")]
    pub event: NamingRule,

    #[serde(default = "default_property_rule")]
    pub property: NamingRule,

    #[serde(default = "default_data_types")]
    pub data_types: Vec<DataType>,

    #[serde(default)]
    pub metadata_schema: Option<MetadataSchema>,
}

impl Default for Conventions {
    fn default() -> Self {
        Self {
            event: default_event_rule(),
            property: default_property_rule(),
            data_types: default_data_types(),
            metadata_schema: None,
        }
    }
}

impl Conventions {
    pub fn allows_type(&self, data_type: DataType) -> bool {
        self.data_types.contains(&data_type)
    }
}

fn default_event_rule() -> NamingRule {
    NamingRule::new(NameCase::Title, false)
}

fn default_property_rule() -> NamingRule {
    NamingRule::new(NameCase::Snake, false)
}

fn default_data_types() -> Vec<DataType> {
    DataType::ALL.to_vec()
}

// --- WAREHOUSE ---

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WarehouseConfig {
    #[serde(rename = "type", default = "default_warehouse_type")]
    pub kind: String,

    #[serde(default)]
    pub database: Option<String>,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            kind: default_warehouse_type(),
            database: None,
        }
    }
}

impl WarehouseConfig {
    pub fn dialect(&self) -> Result<Dialect, DomainError> {
        self.kind.parse()
    }
}

fn default_warehouse_type() -> String {
    "snowflake".to_string()
}

// --- ARTIFACTS (dbt) ---

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct ArtifactsConfig {
    #[serde(default)]
    pub dbt: DbtConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DbtConfig {
    #[serde(default = "default_package_prefix")]
    pub package_prefix: String,

    /// Optional path (relative to the project root) to a custom column mapping.
    #[serde(default)]
    pub column_mapping: Option<String>,

    #[serde(default)]
    pub sources: SourcesConfig,

    #[serde(default)]
    pub models: ModelsConfig,

    #[serde(default)]
    pub docs: DocsConfig,
}

impl Default for DbtConfig {
    fn default() -> Self {
        Self {
            package_prefix: default_package_prefix(),
            column_mapping: None,
            sources: SourcesConfig::default(),
            models: ModelsConfig::default(),
            docs: DocsConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SourcesConfig {
    #[serde(default = "default_source_prefix")]
    pub prefix: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            prefix: default_source_prefix(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ModelsConfig {
    #[serde(default = "default_model_prefix")]
    pub prefix: String,

    #[serde(default = "default_materialized")]
    pub materialized: String,

    #[serde(default)]
    pub incremental_logic: Option<String>,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            prefix: default_model_prefix(),
            materialized: default_materialized(),
            incremental_logic: None,
        }
    }
}

impl ModelsConfig {
    pub fn materialization(&self) -> Result<Materialization, DomainError> {
        self.materialized.parse()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DocsConfig {
    #[serde(default = "default_doc_prefix")]
    pub prefix: String,

    #[serde(default)]
    pub in_folder: bool,

    /// Per semantic column test override (`event_id: [not_null, unique]`).
    #[serde(default)]
    pub tests: BTreeMap<String, Vec<String>>,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            prefix: default_doc_prefix(),
            in_folder: false,
            tests: BTreeMap::new(),
        }
    }
}

fn default_package_prefix() -> String {
    "reflekt_".to_string()
}
fn default_source_prefix() -> String {
    "src_".to_string()
}
fn default_model_prefix() -> String {
    "stg_".to_string()
}
fn default_doc_prefix() -> String {
    "_stg_".to_string()
}
fn default_materialized() -> String {
    "view".to_string()
}

// --- PROJECT ---

#[derive(Debug, Deserialize, Serialize, Clone, Validate, PartialEq)]
pub struct ProjectConfig {
    #[validate(length(min = 1, message = "Project name cannot be empty"))]
    pub name: String,

    #[serde(default = "default_version")]
    pub version: String,

    #[serde(rename = "plans-path", default = "default_plans_path")]
    pub plans_path: String,

    #[serde(rename = "artifacts-path", default = "default_artifacts_path")]
    pub artifacts_path: String,

    #[serde(default)]
    pub conventions: Conventions,

    #[serde(default)]
    pub warehouse: WarehouseConfig,

    #[serde(default)]
    pub artifacts: ArtifactsConfig,
}

impl ProjectConfig {
    /// Configuration with every section at its default value.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: default_version(),
            plans_path: default_plans_path(),
            artifacts_path: default_artifacts_path(),
            conventions: Conventions::default(),
            warehouse: WarehouseConfig::default(),
            artifacts: ArtifactsConfig::default(),
        }
    }

    pub fn dbt(&self) -> &DbtConfig {
        &self.artifacts.dbt
    }
}

fn default_version() -> String {
    "1.0".to_string()
}
fn default_plans_path() -> String {
    "tracking-plans".to_string()
}
fn default_artifacts_path() -> String {
    "artifacts".to_string()
}
