// reflekt-core/src/application/lint.rs

use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::domain::plan::Plan;
use crate::domain::ports::PlanLoader;
use crate::domain::project::{Conventions, ProjectConfig};
use crate::error::ReflektError;

/// `<project>/<plans-path>/<plan>`
pub fn plan_dir(project_dir: &Path, config: &ProjectConfig, plan_name: &str) -> PathBuf {
    project_dir.join(&config.plans_path).join(plan_name)
}

/// Loads a plan and runs every validation (naming, reserved words, duplicates).
pub fn load_plan(
    loader: &dyn PlanLoader,
    plan_dir: &Path,
    conventions: &Conventions,
) -> Result<Plan, ReflektError> {
    let plan = loader.load(plan_dir, conventions)?;
    plan.validate(conventions)?;
    Ok(plan)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintSummary {
    pub plan: String,
    pub events: usize,
    pub latest_events: usize,
    pub properties: usize,
    pub user_traits: usize,
    pub group_traits: usize,
}

impl LintSummary {
    pub fn of(plan: &Plan) -> Self {
        Self {
            plan: plan.name().to_string(),
            events: plan.events().len(),
            latest_events: plan.latest_events().len(),
            properties: plan.property_count(),
            user_traits: plan.user_traits().len(),
            group_traits: plan.group_traits().len(),
        }
    }
}

impl fmt::Display for LintSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}': {} event version(s) ({} distinct), {} properties, {} user trait(s), {} group trait(s)",
            self.plan, self.events, self.latest_events, self.properties, self.user_traits, self.group_traits
        )
    }
}

pub fn lint_plan(
    loader: &dyn PlanLoader,
    plan_dir: &Path,
    conventions: &Conventions,
) -> Result<LintSummary, ReflektError> {
    info!("🔎 Linting tracking plan at {:?}", plan_dir);
    let plan = load_plan(loader, plan_dir, conventions)?;
    let summary = LintSummary::of(&plan);
    info!("✅ {}", summary);
    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::error::DomainError;
    use crate::infrastructure::plan::PlanDiscovery;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    fn write_plan(root: &Path, events: &str) -> Result<()> {
        fs::create_dir_all(root.join("events"))?;
        fs::write(root.join("plan.yml"), "name: shop\n")?;
        fs::write(root.join("events").join("cart.yml"), events)?;
        fs::write(
            root.join("user-traits.yml"),
            "traits:\n  - { name: email, description: Email, type: string }\n",
        )?;
        Ok(())
    }

    #[test]
    fn test_lint_counts() -> Result<()> {
        let dir = tempdir()?;
        write_plan(
            dir.path(),
            r#"
- name: Cart Viewed
  version: 1
  description: Viewed the cart
  properties:
    - { name: cart_id, description: Cart id, type: string }
- name: Cart Viewed
  version: 2
  description: Viewed the cart
  properties:
    - { name: cart_id, description: Cart id, type: string }
    - { name: total, description: Total, type: number }
"#,
        )?;

        let summary = lint_plan(&PlanDiscovery, dir.path(), &Conventions::default())?;
        assert_eq!(
            summary,
            LintSummary {
                plan: "shop".to_string(),
                events: 2,
                latest_events: 1,
                properties: 3,
                user_traits: 1,
                group_traits: 0,
            }
        );
        Ok(())
    }

    #[test]
    fn test_lint_reports_duplicates() -> Result<()> {
        let dir = tempdir()?;
        write_plan(
            dir.path(),
            r#"
- { name: Cart Viewed, description: d, properties: [] }
- { name: Cart Viewed, description: d, properties: [] }
"#,
        )?;

        let err = lint_plan(&PlanDiscovery, dir.path(), &Conventions::default()).unwrap_err();
        assert!(matches!(
            err,
            ReflektError::Domain(DomainError::Duplicate { ref kind, .. }) if kind == "event"
        ));
        Ok(())
    }

    #[test]
    fn test_plan_dir_layout() {
        let config = ProjectConfig::with_name("shop");
        assert_eq!(
            plan_dir(Path::new("/p"), &config, "shop"),
            PathBuf::from("/p/tracking-plans/shop")
        );
    }
}
