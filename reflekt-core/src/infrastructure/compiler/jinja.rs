// reflekt-core/src/infrastructure/compiler/jinja.rs

// Syntax check for dbt Jinja (models and configured SQL snippets).
// Templates are parsed, never rendered: dbt owns the functions they call.

use crate::infrastructure::error::InfrastructureError;
use minijinja::Environment;

#[derive(Debug, Default, Clone, Copy)]
pub struct JinjaChecker;

impl JinjaChecker {
    pub fn new() -> Self {
        Self
    }

    /// Parses `source`; `name` only labels the error.
    pub fn check(&self, name: &str, source: &str) -> Result<(), InfrastructureError> {
        let env = Environment::new();
        let parsed = env.template_from_named_str(name, source).map(|_| ());
        parsed.map_err(InfrastructureError::TemplateError)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_dbt_model_parses() -> Result<()> {
        let checker = JinjaChecker::new();
        checker.check(
            "stg_web__tracks.sql",
            "{{\n  config(\n    materialized='incremental',\n    unique_key='event_id'\n  )\n}}\n\
             select * from {{ source('web', 'tracks') }}\n\
             {%- if is_incremental() %}\nwhere received_at > (select max(received_at_tstamp) from {{ this }})\n{%- endif %}\n",
        )?;
        Ok(())
    }

    #[test]
    fn test_unbalanced_block_is_rejected() {
        let checker = JinjaChecker::new();
        let err = checker
            .check("incremental_logic", "{% if is_incremental() %} where 1=1")
            .unwrap_err();
        assert!(matches!(err, InfrastructureError::TemplateError(_)));
    }
}
