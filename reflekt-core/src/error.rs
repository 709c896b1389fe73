// reflekt-core/src/error.rs

use crate::domain::error::DomainError;
use crate::infrastructure::error::InfrastructureError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReflektError {
    // --- DOMAIN (validation, naming, CDP payloads, configuration) ---
    #[error(transparent)]
    Domain(#[from] DomainError),

    // --- INFRASTRUCTURE (IO, parsing, warehouse) ---
    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),
}

impl From<std::io::Error> for ReflektError {
    fn from(err: std::io::Error) -> Self {
        ReflektError::Infrastructure(InfrastructureError::Io(err))
    }
}

impl ReflektError {
    /// True for errors the user fixes in `reflekt_project.yml` rather than in the plan.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ReflektError::Domain(DomainError::InvalidConfiguration(_))
                | ReflektError::Infrastructure(
                    InfrastructureError::ConfigError(_) | InfrastructureError::ConfigNotFound(_)
                )
        )
    }
}
