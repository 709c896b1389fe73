// reflekt/src/commands/push.rs
//
// USE CASE: Export a tracking plan as a CDP payload.

use std::path::PathBuf;

use reflekt_core::application::{load_plan, plan_dir, push_plan};
use reflekt_core::domain::cdp::CdpKind;
use reflekt_core::infrastructure::plan::PlanDiscovery;

pub fn execute(
    project_dir: PathBuf,
    plan: String,
    cdp: String,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let kind: CdpKind = cdp.parse()?;
    let config = super::load_config(&project_dir)?;
    let tracking_plan = load_plan(
        &PlanDiscovery,
        &plan_dir(&project_dir, &config, &plan),
        &config.conventions,
    )?;

    let output = output
        .map(|o| project_dir.join(o))
        .unwrap_or_else(|| project_dir.join(format!("{}.{}.json", plan, kind)));
    push_plan(&tracking_plan, kind, &config.conventions, &output)?;

    println!(
        "✨ {} event(s) exported to {}",
        tracking_plan.events().len(),
        output.display()
    );
    Ok(())
}
