pub mod project;

pub use crate::domain::project::ProjectConfig;
pub use project::{load_column_mapping, load_fragment, load_project_config};
