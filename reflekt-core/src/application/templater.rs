// reflekt-core/src/application/templater.rs
//
// dbt package generation. Everything fatal (configuration, plan validation,
// selection, Jinja syntax) is raised by `render_package`, before the staging
// area is touched. Warehouse introspection failures only skip their table.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

use crate::domain::dbt::artifact::{SourceTable, models_dir, package_name, source_path};
use crate::domain::dbt::{
    CallType, ColumnMapping, SourceEntry, SourceFile, TableBuilder, TableSpec, identifier,
};
use crate::domain::error::DomainError;
use crate::domain::plan::{Plan, Property};
use crate::domain::project::{Dialect, Materialization, ProjectConfig};
use crate::error::ReflektError;
use crate::infrastructure::compiler::JinjaChecker;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::fs::PackageStaging;
use crate::ports::warehouse::ColumnOracle;

pub const PAGE_EVENT: &str = "Page Viewed";
pub const SCREEN_EVENT: &str = "Screen Viewed";

/// A table skipped because the warehouse could not describe it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntrospectionWarning {
    pub schema: String,
    pub table: String,
    pub message: String,
}

impl fmt::Display for IntrospectionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} skipped: {}", self.schema, self.table, self.message)
    }
}

/// An event left out because its table name is already taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEvent {
    pub event: String,
    pub table: String,
}

impl fmt::Display for SkippedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' skipped: table '{}' is already templated", self.event, self.table)
    }
}

#[derive(Debug, Clone)]
pub struct TemplateRequest<'a> {
    pub plan: &'a Plan,
    /// Warehouse schema holding the raw CDP tables.
    pub schema: String,
    /// Comma-separated table or event names. `None` templates everything.
    pub selection: Option<String>,
}

/// In-memory package: relative path -> file content.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPackage {
    pub schema: String,
    pub files: BTreeMap<PathBuf, String>,
    pub models: Vec<String>,
    pub warnings: Vec<IntrospectionWarning>,
    pub skipped_events: Vec<SkippedEvent>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateReport {
    pub package_dir: PathBuf,
    pub models: Vec<String>,
    pub warnings: Vec<IntrospectionWarning>,
    pub skipped_events: Vec<SkippedEvent>,
}

impl TemplateReport {
    /// Skipped events and introspection warnings, one per line.
    pub fn warning_summary(&self) -> Option<String> {
        let mut sections = Vec::new();
        if !self.skipped_events.is_empty() {
            let lines: Vec<String> = self.skipped_events.iter().map(|e| format!("  - {}", e)).collect();
            sections.push(format!(
                "{} event(s) skipped on a table name clash:\n{}",
                self.skipped_events.len(),
                lines.join("\n")
            ));
        }
        if !self.warnings.is_empty() {
            let lines: Vec<String> = self.warnings.iter().map(|w| format!("  - {}", w)).collect();
            sections.push(format!(
                "{} table(s) skipped during warehouse introspection:\n{}",
                self.warnings.len(),
                lines.join("\n")
            ));
        }
        if sections.is_empty() {
            None
        } else {
            Some(sections.join("\n"))
        }
    }
}

/// `<project>/<artifacts-path>/<package_prefix><plan>`
pub fn package_dir(project_dir: &Path, config: &ProjectConfig, plan_name: &str) -> PathBuf {
    project_dir
        .join(&config.artifacts_path)
        .join(package_name(config.dbt(), plan_name))
}

pub struct DbtTemplater<'a, O: ColumnOracle + ?Sized> {
    config: &'a ProjectConfig,
    mapping: &'a ColumnMapping,
    oracle: &'a O,
    dialect: Dialect,
    materialization: Materialization,
    checker: JinjaChecker,
}

impl<'a, O: ColumnOracle + ?Sized> DbtTemplater<'a, O> {
    /// Fails on any invalid materialization or warehouse setting.
    pub fn new(
        config: &'a ProjectConfig,
        mapping: &'a ColumnMapping,
        oracle: &'a O,
    ) -> Result<Self, ReflektError> {
        let dialect = config.warehouse.dialect()?;
        let models = &config.dbt().models;
        let materialization = models.materialization()?;
        let checker = JinjaChecker::new();

        if materialization == Materialization::Incremental {
            let logic = models
                .incremental_logic
                .as_deref()
                .filter(|l| !l.trim().is_empty())
                .ok_or_else(|| {
                    DomainError::InvalidConfiguration(
                        "artifacts.dbt.models.incremental_logic is required when materialized is 'incremental'"
                            .to_string(),
                    )
                })?;
            checker.check("incremental_logic", logic)?;
        }

        Ok(Self {
            config,
            mapping,
            oracle,
            dialect,
            materialization,
            checker,
        })
    }

    /// Pure generation: nothing is written.
    pub fn render_package(&self, request: &TemplateRequest<'_>) -> Result<RenderedPackage, ReflektError> {
        let plan = request.plan;
        let schema = request.schema.trim();
        if schema.is_empty() {
            return Err(DomainError::InvalidConfiguration("warehouse schema cannot be empty".into()).into());
        }

        // 1. Plan
        plan.validate(&self.config.conventions)?;

        // 2. Tables
        let (specs, skipped_events) = table_specs(plan);
        let specs = select_tables(specs, request.selection.as_deref())?;

        // 3. Per-table templating
        let builder = TableBuilder {
            config: self.config,
            mapping: self.mapping,
            dialect: self.dialect,
            materialization: self.materialization,
            plan_name: plan.name(),
            schema,
            source_name: schema,
        };

        let mut files = BTreeMap::new();
        let mut models = Vec::new();
        let mut warnings = Vec::new();
        let mut source_tables: Vec<SourceTable> = Vec::new();

        for spec in &specs {
            let columns = match self.oracle.get_columns(schema, &spec.table) {
                Ok(columns) => columns,
                Err(e) => {
                    debug!(table = %spec.table, "Introspection failed, table skipped");
                    warnings.push(IntrospectionWarning {
                        schema: schema.to_string(),
                        table: spec.table.clone(),
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            let artifacts = builder.build(spec, &columns)?;
            let sql = artifacts.model.render();
            self.checker.check(&artifacts.layout.model_name, &sql)?;

            let doc = serde_yaml::to_string(&artifacts.doc).map_err(InfrastructureError::YamlError)?;
            files.insert(artifacts.layout.sql_path.clone(), sql);
            files.insert(artifacts.layout.doc_path.clone(), doc);
            source_tables.push(artifacts.source_table);
            info!(model = %artifacts.layout.model_name, "Model templated");
            models.push(artifacts.layout.model_name);
        }

        // 4. Source manifest
        let source = SourceFile::new(SourceEntry {
            name: schema.to_string(),
            description: format!("Raw events of tracking plan '{}' loaded into '{}'.", plan.name(), schema),
            schema: schema.to_string(),
            database: self.config.warehouse.database.clone(),
            tables: source_tables,
        });
        let source_yaml = serde_yaml::to_string(&source).map_err(InfrastructureError::YamlError)?;
        files.insert(source_path(self.config.dbt(), schema), source_yaml);

        Ok(RenderedPackage {
            schema: schema.to_string(),
            files,
            models,
            warnings,
            skipped_events,
        })
    }

    /// Renders, then replaces `package_dir` with the staged result. The
    /// staging area starts from the existing package, else from `template_dir`.
    #[instrument(skip(self, request), fields(plan = %request.plan.name(), schema = %request.schema))]
    pub fn build(
        &self,
        request: &TemplateRequest<'_>,
        package_dir: &Path,
        template_dir: Option<&Path>,
    ) -> Result<TemplateReport, ReflektError> {
        let rendered = self.render_package(request)?;

        let staging = PackageStaging::prepare(package_dir, template_dir)?;
        staging.clear_dir(&models_dir(&rendered.schema))?;
        for (path, content) in &rendered.files {
            staging.write(path, content)?;
        }
        let package_dir = staging.commit()?;

        // Warnings are reported together, once the run is over
        for skipped in &rendered.skipped_events {
            warn!(event = %skipped.event, table = %skipped.table, "Event table name already used, event skipped");
        }
        for w in &rendered.warnings {
            warn!(schema = %w.schema, table = %w.table, "{}", w.message);
        }

        Ok(TemplateReport {
            package_dir,
            models: rendered.models,
            warnings: rendered.warnings,
            skipped_events: rendered.skipped_events,
        })
    }
}

/// Standard call-type tables, then one table per event (latest version).
/// Events whose table name is already taken come back separately.
fn table_specs(plan: &Plan) -> (Vec<TableSpec<'_>>, Vec<SkippedEvent>) {
    let user_traits: Vec<&Property> = plan.user_traits().iter().collect();
    let group_traits: Vec<&Property> = plan.group_traits().iter().collect();

    let mut specs: Vec<TableSpec<'_>> = CallType::STANDARD
        .iter()
        .map(|call| {
            let properties = match call {
                CallType::Identifies | CallType::Users => user_traits.clone(),
                CallType::Groups => group_traits.clone(),
                CallType::Pages => event_properties(plan, PAGE_EVENT),
                CallType::Screens => event_properties(plan, SCREEN_EVENT),
                CallType::Tracks | CallType::Event => Vec::new(),
            };
            let mut spec = TableSpec::standard(*call, properties);
            spec.event_name = match call {
                CallType::Pages => seeding_event(plan, PAGE_EVENT),
                CallType::Screens => seeding_event(plan, SCREEN_EVENT),
                _ => None,
            };
            spec
        })
        .collect();

    let mut skipped = Vec::new();
    let mut taken: HashSet<String> = specs.iter().map(|s| s.table.clone()).collect();
    for event in plan.latest_events() {
        if event.name() == PAGE_EVENT || event.name() == SCREEN_EVENT {
            continue;
        }
        let table = identifier(event.name());
        if !taken.insert(table.clone()) {
            debug!(event = %event.name(), table = %table, "Event table name already used");
            skipped.push(SkippedEvent {
                event: event.name().to_string(),
                table,
            });
            continue;
        }
        specs.push(TableSpec {
            call: CallType::Event,
            table,
            event_name: Some(event.name().to_string()),
            description: Some(event.description().to_string()),
            version: Some(event.version()),
            properties: event.properties().iter().collect(),
        });
    }
    (specs, skipped)
}

fn seeding_event(plan: &Plan, name: &str) -> Option<String> {
    plan.find_event(name).map(|e| e.name().to_string())
}

fn event_properties<'p>(plan: &'p Plan, name: &str) -> Vec<&'p Property> {
    plan.find_event(name)
        .map(|e| e.properties().iter().collect())
        .unwrap_or_default()
}

/// Keeps the tables named by `selection` (table or event names).
fn select_tables<'p>(
    specs: Vec<TableSpec<'p>>,
    selection: Option<&str>,
) -> Result<Vec<TableSpec<'p>>, DomainError> {
    let Some(selection) = selection else {
        return Ok(specs);
    };

    let mut tokens = Vec::new();
    for token in selection.split(',') {
        let token = token.trim();
        if token.is_empty() {
            return Err(DomainError::InvalidConfiguration(format!(
                "Invalid selection '{}': empty selector",
                selection
            )));
        }
        tokens.push(token);
    }

    let matches = |spec: &TableSpec<'_>, token: &str| {
        spec.table.eq_ignore_ascii_case(token)
            || spec.event_name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(token))
    };

    for token in &tokens {
        if !specs.iter().any(|s| matches(s, token)) {
            return Err(DomainError::InvalidConfiguration(format!(
                "Selector '{}' matches no table or event of the plan",
                token
            )));
        }
    }

    Ok(specs
        .into_iter()
        .filter(|s| tokens.iter().any(|t| matches(s, t)))
        .collect())
}
