// reflekt-core/src/application/cdp.rs
//
// Plan <-> CDP payload files. Transport to the CDP API is left to the caller:
// push produces the JSON body, pull consumes one.

use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::domain::cdp::{CdpConverter, CdpKind};
use crate::domain::plan::Plan;
use crate::domain::ports::PlanWriter;
use crate::domain::project::Conventions;
use crate::error::ReflektError;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::fs::atomic_write;

/// Validates the plan and writes its CDP payload to `output`.
pub fn push_plan(
    plan: &Plan,
    kind: CdpKind,
    conventions: &Conventions,
    output: &Path,
) -> Result<Value, ReflektError> {
    plan.validate(conventions)?;
    let payload = CdpConverter::new(kind, conventions).to_cdp(plan)?;

    let body = serde_json::to_string_pretty(&payload).map_err(InfrastructureError::JsonError)?;
    atomic_write(output, format!("{}\n", body))?;
    info!("📤 Plan '{}' exported for {} to {:?}", plan.name(), kind, output);
    Ok(payload)
}

/// Reads a CDP payload and stores it as a validated plan under `plan_dir`.
/// Nothing is written when the payload does not convert.
pub fn pull_plan(
    input: &Path,
    kind: CdpKind,
    plan_name: &str,
    conventions: &Conventions,
    writer: &dyn PlanWriter,
    plan_dir: &Path,
) -> Result<Plan, ReflektError> {
    let content = fs::read_to_string(input)?;
    let payload: Value = serde_json::from_str(&content).map_err(InfrastructureError::JsonError)?;

    let plan = CdpConverter::new(kind, conventions).pull(&payload, plan_name)?;
    writer.write(plan_dir, &plan.to_raw())?;
    info!("📥 Plan '{}' pulled from {} into {:?}", plan.name(), kind, plan_dir);
    Ok(plan)
}
