// reflekt/src/commands/lint.rs
//
// USE CASE: Validate a tracking plan.

use std::path::PathBuf;

use reflekt_core::application::{lint_plan, plan_dir};
use reflekt_core::infrastructure::plan::PlanDiscovery;

pub fn execute(project_dir: PathBuf, plan: String) -> anyhow::Result<()> {
    let config = super::load_config(&project_dir)?;
    let dir = plan_dir(&project_dir, &config, &plan);

    match lint_plan(&PlanDiscovery, &dir, &config.conventions) {
        Ok(summary) => {
            println!("✨ Plan is valid: {}", summary);
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Lint failed: {}", e);
            std::process::exit(1);
        }
    }
}
