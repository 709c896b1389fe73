// reflekt-core/src/domain/cdp/mod.rs

pub mod avo;
pub mod schema;
pub mod segment;

use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::info;

use crate::domain::error::DomainError;
use crate::domain::plan::{Plan, RawPlan};
use crate::domain::project::Conventions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CdpKind {
    Segment,
    Avo,
}

impl fmt::Display for CdpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CdpKind::Segment => write!(f, "segment"),
            CdpKind::Avo => write!(f, "avo"),
        }
    }
}

impl FromStr for CdpKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "segment" => Ok(CdpKind::Segment),
            "avo" => Ok(CdpKind::Avo),
            other => Err(DomainError::InvalidConfiguration(format!(
                "Unsupported CDP '{}' (expected segment or avo)",
                other
            ))),
        }
    }
}

/// Converts plans to and from one CDP's schema dialect.
pub struct CdpConverter<'a> {
    kind: CdpKind,
    conventions: &'a Conventions,
}

impl<'a> CdpConverter<'a> {
    pub fn new(kind: CdpKind, conventions: &'a Conventions) -> Self {
        Self { kind, conventions }
    }

    pub fn kind(&self) -> CdpKind {
        self.kind
    }

    /// Payload for a validated plan.
    pub fn to_cdp(&self, plan: &Plan) -> Result<Value, DomainError> {
        match self.kind {
            CdpKind::Segment => Ok(segment::plan_to_payload(plan)),
            CdpKind::Avo => Err(DomainError::InvalidConfiguration(
                "Pushing a tracking plan to Avo is not supported".to_string(),
            )),
        }
    }

    /// Pre-validation plan tree. `plan_name` is used when the payload carries none.
    pub fn from_cdp(&self, payload: &Value, plan_name: &str) -> Result<RawPlan, DomainError> {
        match self.kind {
            CdpKind::Segment => segment::payload_to_raw_plan(payload, plan_name),
            CdpKind::Avo => avo::payload_to_raw_plan(payload, plan_name),
        }
    }

    /// `from_cdp`, then build and validate.
    pub fn pull(&self, payload: &Value, plan_name: &str) -> Result<Plan, DomainError> {
        let raw = self.from_cdp(payload, plan_name)?;
        let plan = Plan::from_raw(&raw, self.conventions)?;
        plan.validate(self.conventions)?;
        info!(cdp = %self.kind, plan = %plan.name(), events = plan.events().len(), "Plan pulled");
        Ok(plan)
    }
}
