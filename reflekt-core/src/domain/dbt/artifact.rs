// reflekt-core/src/domain/dbt/artifact.rs
//
// dbt YAML documents (source manifest, model docs) and the naming of the
// generated tables, models and files.

use convert_case::{Case, Casing};
use regex::Regex;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::OnceLock;

use crate::domain::project::DbtConfig;

fn re_non_ident() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[^a-z0-9]+").unwrap_or_else(|_| {
            // hardcoded pattern
            Regex::new("$^").unwrap_or_else(|_| unreachable!())
        })
    })
}

/// Lowercase identifier made of `[a-z0-9_]` ("Cart Viewed" -> `cart_viewed`).
///
/// A name with no ASCII letter or digit (`注文完了`) falls back to `x_` plus
/// the hex of its UTF-8 bytes, so distinct names never share an identifier.
pub fn identifier(name: &str) -> String {
    let snake = name.to_case(Case::Snake).to_lowercase();
    let ident = re_non_ident().replace_all(&snake, "_");
    let ident = ident.trim_matches('_');
    if !ident.is_empty() || name.trim().is_empty() {
        return ident.to_string();
    }
    let hex: String = name.bytes().map(|b| format!("{:02x}", b)).collect();
    format!("x_{}", hex)
}

// --- Source manifest ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceColumn {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceTable {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<SourceColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceEntry {
    pub name: String,
    pub description: String,
    pub schema: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    pub tables: Vec<SourceTable>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceFile {
    pub version: u8,
    pub sources: Vec<SourceEntry>,
}

impl SourceFile {
    pub fn new(entry: SourceEntry) -> Self {
        Self {
            version: 2,
            sources: vec![entry],
        }
    }
}

// --- Model docs ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocColumn {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tests: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocModel {
    pub name: String,
    pub description: String,
    pub columns: Vec<DocColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocFile {
    pub version: u8,
    pub models: Vec<DocModel>,
}

impl DocFile {
    pub fn new(model: DocModel) -> Self {
        Self {
            version: 2,
            models: vec![model],
        }
    }
}

// --- Naming ---

/// Where one templated table lands inside the package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelLayout {
    pub model_name: String,
    pub sql_path: PathBuf,
    pub doc_path: PathBuf,
}

impl ModelLayout {
    /// `version` is only part of the names when greater than 1.
    pub fn new(config: &DbtConfig, schema: &str, table: &str, version: Option<u32>) -> Self {
        let suffix = match version {
            Some(v) if v > 1 => format!("__v{}", v),
            _ => String::new(),
        };
        let stem = format!("{}__{}{}", schema, table, suffix);
        let model_name = format!("{}{}", config.models.prefix, stem);

        let dir = models_dir(schema);
        let doc_dir = if config.docs.in_folder {
            dir.join("docs")
        } else {
            dir.clone()
        };

        Self {
            sql_path: dir.join(format!("{}.sql", model_name)),
            doc_path: doc_dir.join(format!("{}{}.yml", config.docs.prefix, stem)),
            model_name,
        }
    }
}

/// `models/<schema>`, relative to the package root.
pub fn models_dir(schema: &str) -> PathBuf {
    PathBuf::from("models").join(schema)
}

pub fn source_path(config: &DbtConfig, schema: &str) -> PathBuf {
    models_dir(schema).join(format!("{}{}.yml", config.sources.prefix, schema))
}

pub fn package_name(config: &DbtConfig, plan_name: &str) -> String {
    format!("{}{}", config.package_prefix, identifier(plan_name))
}
