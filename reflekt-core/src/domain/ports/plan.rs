use crate::domain::error::DomainError;
use crate::domain::plan::{Plan, RawPlan};
use crate::domain::project::Conventions;
use std::path::Path;

/// Supplies a fully populated, not yet validated plan.
pub trait PlanLoader: Send + Sync {
    fn load(&self, plan_dir: &Path, conventions: &Conventions) -> Result<Plan, DomainError>;
}

/// Persists a plan in the canonical on-disk layout.
pub trait PlanWriter: Send + Sync {
    fn write(&self, plan_dir: &Path, plan: &RawPlan) -> Result<(), DomainError>;
}
