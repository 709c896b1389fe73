// reflekt/src/commands/mod.rs

pub mod dbt;
pub mod lint;
pub mod pull;
pub mod push;

use anyhow::Context;
use std::path::Path;
use reflekt_core::domain::project::ProjectConfig;
use reflekt_core::infrastructure::config::load_project_config;

pub(crate) fn load_config(project_dir: &Path) -> anyhow::Result<ProjectConfig> {
    println!("⚙️  Loading configuration...");
    let config = load_project_config(project_dir).with_context(|| {
        format!(
            "Failed to load project configuration from {:?}",
            project_dir
        )
    })?;
    println!("   Project: {} (v{})", config.name, config.version);
    Ok(config)
}
