// reflekt-core/src/application/mod.rs

pub mod cdp;
pub mod lint;
pub mod templater;

// --- RE-EXPORTS (FACADE) ---
// The CLI only needs `use reflekt_core::application::{lint_plan, DbtTemplater, ...};`

pub use cdp::{pull_plan, push_plan};
pub use lint::{LintSummary, lint_plan, load_plan, plan_dir};
pub use templater::{
    DbtTemplater, IntrospectionWarning, RenderedPackage, SkippedEvent, TemplateReport, TemplateRequest,
    package_dir,
};
