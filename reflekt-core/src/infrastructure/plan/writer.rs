// reflekt-core/src/infrastructure/plan/writer.rs

use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

use super::discovery::{EVENTS_DIR, GROUP_TRAITS_FILE, PLAN_FILE, USER_TRAITS_FILE};
use crate::domain::dbt::identifier;
use crate::domain::error::DomainError;
use crate::domain::plan::{RawEvent, RawPlan};
use crate::domain::ports::PlanWriter;
use crate::infrastructure::fs::atomic_write;

#[derive(Serialize)]
struct PlanHeader<'a> {
    name: &'a str,
}

/// Writes the layout read by `PlanDiscovery`. The `events/` directory is
/// rebuilt from scratch.
pub struct PlanFileWriter;

impl PlanWriter for PlanFileWriter {
    fn write(&self, plan_dir: &Path, plan: &RawPlan) -> Result<(), DomainError> {
        write_plan(plan_dir, plan).map_err(|e| DomainError::PlanError(e.to_string()))
    }
}

fn write_plan(plan_dir: &Path, plan: &RawPlan) -> Result<(), crate::error::ReflektError> {
    fs::create_dir_all(plan_dir)?;
    atomic_write(plan_dir.join(PLAN_FILE), to_yaml(&PlanHeader { name: &plan.name })?)?;

    let events_dir = plan_dir.join(EVENTS_DIR);
    if events_dir.is_dir() {
        fs::remove_dir_all(&events_dir)?;
    }

    // One file per file stem; names sharing a stem share the file, in plan order
    let mut files: Vec<(String, Vec<&RawEvent>)> = Vec::new();
    for event in &plan.events {
        let stem = identifier(&event.name);
        match files.iter_mut().find(|(s, _)| *s == stem) {
            Some((_, events)) => events.push(event),
            None => files.push((stem, vec![event])),
        }
    }
    for (stem, events) in &files {
        let content = match events.as_slice() {
            [single] => to_yaml(single)?,
            many => to_yaml(&many)?,
        };
        atomic_write(events_dir.join(format!("{}.yml", stem)), content)?;
    }

    for (file, traits) in [
        (USER_TRAITS_FILE, &plan.user_traits),
        (GROUP_TRAITS_FILE, &plan.group_traits),
    ] {
        let path = plan_dir.join(file);
        if traits.is_empty() {
            if path.exists() {
                fs::remove_file(&path)?;
            }
        } else {
            atomic_write(path, to_yaml(traits)?)?;
        }
    }

    info!(plan = %plan.name, path = ?plan_dir, events = plan.events.len(), "Plan written");
    Ok(())
}

fn to_yaml<T: Serialize + ?Sized>(value: &T) -> Result<String, crate::error::ReflektError> {
    serde_yaml::to_string(value)
        .map_err(|e| crate::infrastructure::error::InfrastructureError::YamlError(e).into())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::naming::{NameCase, NamingRule};
    use crate::domain::ports::PlanLoader;
    use crate::domain::project::Conventions;
    use crate::infrastructure::plan::PlanDiscovery;
    use anyhow::Result;
    use tempfile::tempdir;

    fn raw_plan() -> RawPlan {
        serde_yaml::from_str(
            r#"
name: shop
events:
  - { name: Cart Viewed, version: 1, description: v1, properties: [] }
  - { name: Order Completed, version: 1, description: done, metadata: { product_owner: Alice }, properties: [] }
  - name: Cart Viewed
    version: 2
    description: v2
    properties:
      - { name: cart_id, description: Cart id, type: string, required: true }
user_traits:
  - { name: email, description: Email, type: string }
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_written_plan_reads_back() -> Result<()> {
        let dir = tempdir()?;
        let plan_dir = dir.path().join("shop");
        PlanFileWriter.write(&plan_dir, &raw_plan())?;

        assert!(plan_dir.join("events").join("cart_viewed.yml").exists());
        assert!(plan_dir.join("events").join("order_completed.yml").exists());
        assert!(!plan_dir.join(GROUP_TRAITS_FILE).exists());

        let conv = Conventions::default();
        let plan = PlanDiscovery.load(&plan_dir, &conv)?;
        plan.validate(&conv)?;
        assert_eq!(plan.events().len(), 3);
        assert_eq!(plan.find_event("Cart Viewed").map(|e| e.version()), Some(2));
        assert_eq!(plan.user_traits().len(), 1);
        Ok(())
    }

    #[test]
    fn test_names_sharing_a_file_stem_are_all_kept() -> Result<()> {
        let dir = tempdir()?;
        let plan_dir = dir.path().join("shop");
        let raw: RawPlan = serde_yaml::from_str(
            r#"
name: shop
events:
  - { name: Cart Viewed, description: spaced, properties: [] }
  - { name: cart_viewed, description: snake, properties: [] }
"#,
        )?;
        PlanFileWriter.write(&plan_dir, &raw)?;

        let entries = fs::read_dir(plan_dir.join("events"))?.count();
        assert_eq!(entries, 1);

        let conv = Conventions {
            event: NamingRule::new(NameCase::Any, true),
            ..Conventions::default()
        };
        let plan = PlanDiscovery.load(&plan_dir, &conv)?;
        assert_eq!(plan.events().len(), 2);
        assert!(plan.find_event("Cart Viewed").is_some());
        assert!(plan.find_event("cart_viewed").is_some());
        Ok(())
    }

    #[test]
    fn test_names_without_ascii_characters_are_kept() -> Result<()> {
        let dir = tempdir()?;
        let plan_dir = dir.path().join("shop");
        let raw: RawPlan = serde_yaml::from_str(
            r#"
name: shop
events:
  - { name: 注文完了, description: Order completed, properties: [] }
  - { name: Cart Viewed, description: Viewed the cart, properties: [] }
"#,
        )?;
        PlanFileWriter.write(&plan_dir, &raw)?;

        let mut files: Vec<String> = fs::read_dir(plan_dir.join("events"))?
            .map(|e| e.map(|e| e.file_name().to_string_lossy().into_owned()))
            .collect::<std::io::Result<_>>()?;
        files.sort();
        assert_eq!(files, vec!["cart_viewed.yml", "x_e6b3a8e69687e5ae8ce4ba86.yml"]);

        let conv = Conventions {
            event: NamingRule::new(NameCase::Any, true),
            ..Conventions::default()
        };
        let plan = PlanDiscovery.load(&plan_dir, &conv)?;
        assert_eq!(plan.events().len(), 2);
        assert!(plan.find_event("注文完了").is_some());
        Ok(())
    }

    #[test]
    fn test_rewrite_drops_stale_event_files() -> Result<()> {
        let dir = tempdir()?;
        let plan_dir = dir.path().join("shop");
        fs::create_dir_all(plan_dir.join("events"))?;
        fs::write(plan_dir.join("events").join("gone.yml"), "name: Gone\n")?;

        PlanFileWriter.write(&plan_dir, &raw_plan())?;
        assert!(!plan_dir.join("events").join("gone.yml").exists());
        Ok(())
    }
}
