// reflekt/src/main.rs

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use commands::dbt::DbtArgs;

fn main() -> anyhow::Result<()> {
    // RUST_LOG=debug reflekt dbt ... to see every templated column
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Lint { project_dir, plan } => commands::lint::execute(project_dir, plan),

        Commands::Dbt {
            project_dir,
            plan,
            schema,
            select,
            columns_file,
            duckdb,
            template,
        } => commands::dbt::execute(DbtArgs {
            project_dir,
            plan,
            schema,
            select,
            columns_file,
            duckdb,
            template,
        }),

        Commands::Push {
            project_dir,
            plan,
            cdp,
            output,
        } => commands::push::execute(project_dir, plan, cdp, output),

        Commands::Pull {
            project_dir,
            plan,
            cdp,
            input,
        } => commands::pull::execute(project_dir, plan, cdp, input),
    }
}
