// reflekt-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("Validation error at '{path}' (field '{field}'): {message}")]
    #[diagnostic(
        code(reflekt::domain::validation),
        help("Fix the schema fragment so it matches the Reflekt property/event format.")
    )]
    Validation {
        path: String,
        field: String,
        message: String,
    },

    #[error("Naming convention violation at '{path}': {message} (rule: {rule})")]
    #[diagnostic(
        code(reflekt::domain::naming),
        help("Rename it, or adjust the `conventions` section of reflekt_project.yml.")
    )]
    NamingConvention {
        path: String,
        rule: String,
        message: String,
    },

    #[error("Duplicate {kind} in '{scope}': [{}]", .duplicates.join(", "))]
    #[diagnostic(code(reflekt::domain::duplicate))]
    Duplicate {
        kind: String,
        scope: String,
        duplicates: Vec<String>,
    },

    #[error("Invalid CDP response: {0}")]
    #[diagnostic(
        code(reflekt::domain::api_response),
        help("The payload does not have the shape expected for this CDP.")
    )]
    ApiResponse(String),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code(reflekt::domain::configuration),
        help("Check the `artifacts` and `warehouse` sections of reflekt_project.yml.")
    )]
    InvalidConfiguration(String),

    #[error("Plan loading Error: {0}")]
    #[diagnostic(code(reflekt::domain::plan))]
    PlanError(String),
}

impl DomainError {
    pub fn validation(
        path: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        DomainError::Validation {
            path: path.into(),
            field: field.into(),
            message: message.into(),
        }
    }
}
