// reflekt/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "reflekt")]
#[command(about = "Tracking plans as code: lint, sync with CDPs, template dbt packages", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🔎 Validates a tracking plan against the project conventions
    Lint {
        /// Project directory
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Plan name (directory under the plans path)
        #[arg(long, short)]
        plan: String,
    },

    /// 🏗️  Templates a dbt package for a tracking plan
    Dbt {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        #[arg(long, short)]
        plan: String,

        /// Warehouse schema holding the raw CDP tables
        #[arg(long, short = 'S')]
        schema: String,

        /// Templates only these tables or events (comma-separated)
        #[arg(long, short)]
        select: Option<String>,

        /// YAML snapshot of the warehouse columns (schema -> table -> [columns])
        #[arg(long, conflicts_with = "duckdb")]
        columns_file: Option<PathBuf>,

        /// DuckDB database to introspect
        #[arg(long, env = "REFLEKT_DUCKDB_PATH")]
        duckdb: Option<PathBuf>,

        /// Directory seeding a brand new package (dbt_project.yml, macros...)
        #[arg(long)]
        template: Option<PathBuf>,
    },

    /// 📤 Exports a tracking plan as a CDP payload (JSON)
    Push {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        #[arg(long, short)]
        plan: String,

        /// segment | avo
        #[arg(long, default_value = "segment")]
        cdp: String,

        /// Output file (default: <plan>.<cdp>.json in the project directory)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// 📥 Imports a CDP payload (JSON) as a tracking plan
    Pull {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        #[arg(long, short)]
        plan: String,

        /// segment | avo
        #[arg(long, default_value = "segment")]
        cdp: String,

        /// Payload file
        #[arg(long, short)]
        input: PathBuf,
    },
}
