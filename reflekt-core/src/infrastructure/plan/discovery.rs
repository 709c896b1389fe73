// reflekt-core/src/infrastructure/plan/discovery.rs
//
// Reads a plan directory:
//   plan.yml              name of the plan
//   events/**/*.yml       one event, or a list of versions of one event
//   user-traits.yml       list of properties, or `traits: [...]`
//   group-traits.yml      same

use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};
use walkdir::WalkDir;

use crate::domain::error::DomainError;
use crate::domain::plan::{Event, Plan, Property, RawEvent, RawProperty};
use crate::domain::ports::PlanLoader;
use crate::domain::project::Conventions;

pub const PLAN_FILE: &str = "plan.yml";
pub const EVENTS_DIR: &str = "events";
pub const USER_TRAITS_FILE: &str = "user-traits.yml";
pub const GROUP_TRAITS_FILE: &str = "group-traits.yml";

#[derive(Deserialize)]
struct PlanHeader {
    name: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TraitsFile {
    Wrapped { traits: Vec<RawProperty> },
    List(Vec<RawProperty>),
}

pub struct PlanDiscovery;

impl PlanLoader for PlanDiscovery {
    fn load(&self, plan_dir: &Path, conventions: &Conventions) -> Result<Plan, DomainError> {
        Self::discover(plan_dir, conventions)
    }
}

impl PlanDiscovery {
    #[instrument(skip(conventions))]
    pub fn discover(plan_dir: &Path, conventions: &Conventions) -> Result<Plan, DomainError> {
        if !plan_dir.is_dir() {
            return Err(DomainError::PlanError(format!(
                "Plan directory {:?} does not exist",
                plan_dir
            )));
        }

        // 1. Header
        let header: PlanHeader = read_yaml(&plan_dir.join(PLAN_FILE))?;
        let mut plan = Plan::new(header.name);
        info!(plan = %plan.name(), "Loading tracking plan");

        // 2. Events, in path order
        for path in event_files(&plan_dir.join(EVENTS_DIR)) {
            debug!(file = ?path, "Reading event file");
            for raw in read_events(&path)? {
                plan.add_event(Event::from_raw(&raw, conventions)?);
            }
        }

        // 3. Traits
        for trait_ in read_traits(&plan_dir.join(USER_TRAITS_FILE), "user_traits", conventions)? {
            plan.add_user_trait(trait_);
        }
        for trait_ in read_traits(&plan_dir.join(GROUP_TRAITS_FILE), "group_traits", conventions)? {
            plan.add_group_trait(trait_);
        }

        info!(
            plan = %plan.name(),
            events = plan.events().len(),
            user_traits = plan.user_traits().len(),
            group_traits = plan.group_traits().len(),
            "Tracking plan loaded"
        );
        Ok(plan)
    }
}

fn event_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }
    WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "yml" || ext == "yaml"))
        .collect()
}

fn read_events(path: &Path) -> Result<Vec<RawEvent>, DomainError> {
    let value: serde_yaml::Value = read_yaml(path)?;
    let parsed = match value {
        serde_yaml::Value::Sequence(_) => serde_yaml::from_value::<Vec<RawEvent>>(value),
        other => serde_yaml::from_value::<RawEvent>(other).map(|e| vec![e]),
    };
    parsed.map_err(|e| DomainError::validation(path.display().to_string(), "schema", e.to_string()))
}

fn read_traits(
    path: &Path,
    scope: &str,
    conventions: &Conventions,
) -> Result<Vec<Property>, DomainError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = match read_yaml::<Option<TraitsFile>>(path)? {
        Some(TraitsFile::Wrapped { traits }) | Some(TraitsFile::List(traits)) => traits,
        None => Vec::new(),
    };
    raw.iter()
        .map(|r| Property::from_raw(r, scope, conventions))
        .collect()
}

fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, DomainError> {
    let content = fs::read_to_string(path)
        .map_err(|e| DomainError::PlanError(format!("Cannot read {}: {}", path.display(), e)))?;
    serde_yaml::from_str(&content)
        .map_err(|e| DomainError::validation(path.display().to_string(), "yaml", e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_discover_plan_directory() -> Result<()> {
        let dir = tempdir()?;
        let root = dir.path();
        write(root, "plan.yml", "name: shop\n");
        write(
            root,
            "events/cart/cart_viewed.yml",
            r#"
- name: Cart Viewed
  version: 1
  description: Viewed the cart
  properties:
    - { name: cart_id, description: Cart id, type: string, required: true }
- name: Cart Viewed
  version: 2
  description: Viewed the cart
  properties:
    - { name: cart_id, description: Cart id, type: string, required: true }
    - { name: total, description: Total, type: number, allow_null: true }
"#,
        );
        write(
            root,
            "events/order_completed.yml",
            "name: Order Completed\ndescription: Order done\nproperties: []\n",
        );
        write(
            root,
            "user-traits.yml",
            "traits:\n  - { name: email, description: Email, type: string }\n",
        );
        write(root, "group-traits.yml", "- { name: plan_tier, description: Tier, type: string }\n");

        let plan = PlanDiscovery.load(root, &Conventions::default())?;
        plan.validate(&Conventions::default())?;

        let names: Vec<String> = plan.events().iter().map(|e| e.label()).collect();
        assert_eq!(
            names,
            vec!["Cart Viewed (v1)", "Cart Viewed (v2)", "Order Completed (v1)"]
        );
        assert_eq!(plan.user_traits()[0].name(), "email");
        assert_eq!(plan.group_traits()[0].name(), "plan_tier");
        Ok(())
    }

    #[test]
    fn test_parse_error_names_the_file() -> Result<()> {
        let dir = tempdir()?;
        write(dir.path(), "plan.yml", "name: shop\n");
        write(dir.path(), "events/bad.yml", "name: Bad\ndescription: d\ncolour: red\n");

        let err = PlanDiscovery.load(dir.path(), &Conventions::default()).unwrap_err();
        match err {
            DomainError::Validation { path, .. } => assert!(path.ends_with("bad.yml")),
            other => panic!("unexpected {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_missing_plan_directory() {
        let err = PlanDiscovery
            .load(Path::new("/definitely/not/here"), &Conventions::default())
            .unwrap_err();
        assert!(matches!(err, DomainError::PlanError(_)));
    }
}
