// reflekt/src/commands/dbt.rs
//
// USE CASE: Template the dbt package of a tracking plan.

use std::path::PathBuf;

use anyhow::{Context, bail};
use reflekt_core::application::{DbtTemplater, TemplateRequest, load_plan, package_dir, plan_dir};
use reflekt_core::infrastructure::adapters::{DuckDbOracle, StaticWarehouse};
use reflekt_core::infrastructure::config::load_column_mapping;
use reflekt_core::infrastructure::plan::PlanDiscovery;
use reflekt_core::ports::warehouse::ColumnOracle;

pub struct DbtArgs {
    pub project_dir: PathBuf,
    pub plan: String,
    pub schema: String,
    pub select: Option<String>,
    pub columns_file: Option<PathBuf>,
    pub duckdb: Option<PathBuf>,
    pub template: Option<PathBuf>,
}

pub fn execute(args: DbtArgs) -> anyhow::Result<()> {
    let start = std::time::Instant::now();
    let project_dir = &args.project_dir;

    // A. Config + plan
    let config = super::load_config(project_dir)?;
    let mapping = load_column_mapping(project_dir, &config)?;
    let plan = load_plan(
        &PlanDiscovery,
        &plan_dir(project_dir, &config, &args.plan),
        &config.conventions,
    )?;

    // B. Warehouse adapter
    let oracle: Box<dyn ColumnOracle> = match (&args.columns_file, &args.duckdb) {
        (Some(file), _) => {
            println!("   Warehouse: snapshot {}", file.display());
            Box::new(
                StaticWarehouse::from_file(&project_dir.join(file))
                    .with_context(|| format!("Failed to read warehouse snapshot {:?}", file))?,
            )
        }
        (None, Some(db)) => {
            println!("   Warehouse: DuckDB 🦆 {}", db.display());
            let db_path = project_dir.join(db);
            Box::new(
                DuckDbOracle::new(&db_path.to_string_lossy())
                    .with_context(|| format!("Failed to open DuckDB at {:?}", db_path))?,
            )
        }
        (None, None) => bail!("No warehouse given: use --columns-file or --duckdb"),
    };

    // C. Template
    let templater = DbtTemplater::new(&config, &mapping, oracle.as_ref())?;
    let request = TemplateRequest {
        plan: &plan,
        schema: args.schema.clone(),
        selection: args.select.clone(),
    };
    let template = args.template.as_ref().map(|t| project_dir.join(t));
    let report = templater.build(
        &request,
        &package_dir(project_dir, &config, plan.name()),
        template.as_deref(),
    )?;

    println!("📝 {} model(s) templated.", report.models.len());
    if let Some(summary) = report.warning_summary() {
        println!("⚠️  {}", summary);
    }
    println!(
        "✨ dbt package written to {} in {:.2?}",
        report.package_dir.display(),
        start.elapsed()
    );
    Ok(())
}
