// reflekt-core/src/infrastructure/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DatabaseError {
    #[error("DuckDB Engine Error: {0}")]
    #[diagnostic(
        code(reflekt::infra::database::duckdb),
        help("An error occurred while introspecting the warehouse.")
    )]
    DuckDB(#[from] duckdb::Error),
}

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- DATABASE ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Database(#[from] DatabaseError),

    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(reflekt::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    #[error("Failed to copy package tree: {0}")]
    #[diagnostic(code(reflekt::infra::copy))]
    CopyError(String),

    // --- CONFIG / YAML / JSON ---
    #[error("YAML Parsing Error: {0}")]
    #[diagnostic(
        code(reflekt::infra::yaml),
        help("Check your YAML syntax (indentation, types).")
    )]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON Parsing Error: {0}")]
    #[diagnostic(
        code(reflekt::infra::json),
        help("The CDP payload must be a single JSON document.")
    )]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration Error: {0}")]
    #[diagnostic(code(reflekt::infra::config))]
    ConfigError(String),

    #[error("Project configuration not found at '{0}'")]
    #[diagnostic(
        code(reflekt::infra::config_missing),
        help("Run the command from a directory containing reflekt_project.yml.")
    )]
    ConfigNotFound(String),

    // --- TEMPLATING ---
    #[error("Template Syntax Error: {0}")]
    #[diagnostic(
        code(reflekt::infra::template),
        help("Check the Jinja syntax ({{ ... }}) of the generated or configured SQL.")
    )]
    TemplateError(#[from] minijinja::Error),
}

impl From<duckdb::Error> for InfrastructureError {
    fn from(err: duckdb::Error) -> Self {
        InfrastructureError::Database(DatabaseError::DuckDB(err))
    }
}

impl From<fs_extra::error::Error> for InfrastructureError {
    fn from(err: fs_extra::error::Error) -> Self {
        InfrastructureError::CopyError(err.to_string())
    }
}
