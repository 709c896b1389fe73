// reflekt-core/src/infrastructure/config/project.rs

use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};
use validator::Validate;

use crate::domain::dbt::ColumnMapping;
use crate::domain::project::configuration::ProjectConfig;
use crate::infrastructure::error::InfrastructureError;

pub const CONFIG_CANDIDATES: [&str; 2] = ["reflekt_project.yml", "reflekt_project.yaml"];

pub const ENV_ARTIFACTS_PATH: &str = "REFLEKT_ARTIFACTS_PATH";
pub const ENV_PLANS_PATH: &str = "REFLEKT_PLANS_PATH";

// --- LOADER ---

#[instrument(skip(project_dir))]
pub fn load_project_config(project_dir: &Path) -> Result<ProjectConfig, InfrastructureError> {
    // 1. Découverte du fichier principal
    let config_path = find_main_config(project_dir)?;
    info!(path = ?config_path, "Loading project configuration");

    // 2. Chargement YAML + validation
    let mut config: ProjectConfig = load_fragment(&config_path)?;
    config.validate().map_err(|e| {
        InfrastructureError::ConfigError(format!("{}: {}", config_path.display(), e))
    })?;

    // 3. Override via variables d'environnement (layering)
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    Ok(config)
}

pub fn find_main_config(root: &Path) -> Result<PathBuf, InfrastructureError> {
    for filename in CONFIG_CANDIDATES {
        let p = root.join(filename);
        if p.exists() {
            return Ok(p);
        }
    }
    Err(InfrastructureError::ConfigNotFound(format!(
        "No configuration file found in {:?}. Checked: {:?}",
        root, CONFIG_CANDIDATES
    )))
}

/// Typed YAML document from `path`.
pub fn load_fragment<T: DeserializeOwned>(path: &Path) -> Result<T, InfrastructureError> {
    let content = fs::read_to_string(path)?;
    serde_yaml::from_str(&content).map_err(|e| {
        InfrastructureError::ConfigError(format!("Failed to parse {}: {}", path.display(), e))
    })
}

fn apply_env_overrides<F>(config: &mut ProjectConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup(ENV_ARTIFACTS_PATH) {
        info!(old = ?config.artifacts_path, new = ?val, "Overriding artifacts path via ENV");
        config.artifacts_path = val;
    }
    if let Some(val) = lookup(ENV_PLANS_PATH) {
        info!(old = ?config.plans_path, new = ?val, "Overriding plans path via ENV");
        config.plans_path = val;
    }
}

/// Custom mapping from `artifacts.dbt.column_mapping` when set, else the
/// bundled Segment mapping.
pub fn load_column_mapping(
    project_dir: &Path,
    config: &ProjectConfig,
) -> Result<ColumnMapping, InfrastructureError> {
    let mapping = match &config.dbt().column_mapping {
        Some(rel) => {
            let path = project_dir.join(rel);
            info!(path = ?path, "Loading custom column mapping");
            let content = fs::read_to_string(&path)?;
            ColumnMapping::from_yaml(&content)
        }
        None => ColumnMapping::segment(),
    };
    mapping.map_err(|e| InfrastructureError::ConfigError(e.to_string()))
}
