// reflekt/src/commands/pull.rs
//
// USE CASE: Import a CDP payload as a tracking plan.

use std::path::PathBuf;

use reflekt_core::application::{plan_dir, pull_plan};
use reflekt_core::domain::cdp::CdpKind;
use reflekt_core::infrastructure::plan::PlanFileWriter;

pub fn execute(project_dir: PathBuf, plan: String, cdp: String, input: PathBuf) -> anyhow::Result<()> {
    let kind: CdpKind = cdp.parse()?;
    let config = super::load_config(&project_dir)?;
    let dir = plan_dir(&project_dir, &config, &plan);

    println!("📥 Pulling '{}' from {}...", plan, kind);
    let pulled = pull_plan(
        &project_dir.join(&input),
        kind,
        &plan,
        &config.conventions,
        &PlanFileWriter,
        &dir,
    )?;

    println!(
        "✨ {} event(s) written to {}",
        pulled.events().len(),
        dir.display()
    );
    Ok(())
}
