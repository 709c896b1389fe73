// reflekt-core/src/domain/dbt/sql.rs
//
// Staging model SQL: a config header plus a `source -> renamed -> select *`
// skeleton. Columns are collected first and joined once.

use crate::domain::project::{Dialect, Materialization};

#[derive(Debug, Clone, PartialEq)]
pub struct SelectColumn {
    pub expression: String,
    pub alias: String,
}

impl SelectColumn {
    pub fn new(expression: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            alias: alias.into(),
        }
    }

    pub fn render(&self) -> String {
        if self.expression == self.alias {
            self.expression.clone()
        } else {
            format!("{} as {}", self.expression, self.alias)
        }
    }
}

/// `{{ config(...) }}` block for the configured materialization.
pub fn config_header(
    materialization: Materialization,
    dialect: Dialect,
    unique_key: &str,
    cluster_by: &str,
) -> String {
    match materialization {
        Materialization::View => "{{ config(materialized='view') }}".to_string(),
        Materialization::Incremental => {
            let mut args = vec![
                "materialized='incremental'".to_string(),
                format!("unique_key='{}'", unique_key),
            ];
            match dialect {
                Dialect::Redshift => args.push(format!("sort='{}'", cluster_by)),
                Dialect::Snowflake => args.push(format!("cluster_by=['{}']", cluster_by)),
                Dialect::DuckDb => {}
            }
            let args: Vec<String> = args.into_iter().map(|a| format!("    {}", a)).collect();
            format!("{{{{\n  config(\n{}\n  )\n}}}}", args.join(",\n"))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelSql {
    pub header: String,
    pub source_name: String,
    pub table: String,
    pub incremental_logic: Option<String>,
    pub columns: Vec<SelectColumn>,
}

impl ModelSql {
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.header);
        out.push_str("\n\nwith\n\nsource as (\n\n    select *\n");
        out.push_str(&format!(
            "    from {{{{ source('{}', '{}') }}}}\n",
            self.source_name, self.table
        ));

        if let Some(logic) = &self.incremental_logic {
            for line in logic.trim_end().lines() {
                if line.trim().is_empty() {
                    out.push('\n');
                } else {
                    out.push_str(&format!("    {}\n", line));
                }
            }
        }

        out.push_str("\n),\n\nrenamed as (\n\n    select\n");
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("        {}", c.render()))
            .collect();
        out.push_str(&columns.join(",\n"));
        out.push_str("\n    from source\n\n)\n\nselect * from renamed\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_header() {
        let header = config_header(Materialization::View, Dialect::Snowflake, "event_id", "tstamp");
        insta::assert_snapshot!(header, @"{{ config(materialized='view') }}");
    }

    #[test]
    fn test_incremental_header_per_dialect() {
        let snowflake = config_header(Materialization::Incremental, Dialect::Snowflake, "event_id", "tstamp");
        assert_eq!(
            snowflake,
            "{{\n  config(\n    materialized='incremental',\n    unique_key='event_id',\n    cluster_by=['tstamp']\n  )\n}}"
        );

        let redshift = config_header(Materialization::Incremental, Dialect::Redshift, "event_id", "tstamp");
        assert!(redshift.contains("    unique_key='event_id',\n    sort='tstamp'\n"));

        let duckdb = config_header(Materialization::Incremental, Dialect::DuckDb, "event_id", "tstamp");
        assert!(duckdb.contains("    unique_key='event_id'\n  )"));
    }

    #[test]
    fn test_model_skeleton() {
        let model = ModelSql {
            header: config_header(Materialization::View, Dialect::Snowflake, "event_id", "tstamp"),
            source_name: "web".to_string(),
            table: "cart_viewed".to_string(),
            incremental_logic: None,
            columns: vec![
                SelectColumn::new("id", "event_id"),
                SelectColumn::new("cart_id", "cart_id"),
            ],
        };

        let expected = r#"{{ config(materialized='view') }}

with

source as (

    select *
    from {{ source('web', 'cart_viewed') }}

),

renamed as (

    select
        id as event_id,
        cart_id
    from source

)

select * from renamed
"#;
        assert_eq!(model.render(), expected);
    }

    #[test]
    fn test_incremental_logic_is_spliced_after_source() {
        let model = ModelSql {
            header: String::new(),
            source_name: "web".to_string(),
            table: "tracks".to_string(),
            incremental_logic: Some(
                "{%- if is_incremental() %}\nwhere received_at >= (select max(received_at_tstamp) from {{ this }})\n{%- endif %}\n"
                    .to_string(),
            ),
            columns: vec![SelectColumn::new("id", "event_id")],
        };
        let sql = model.render();
        assert!(sql.contains(
            "    from {{ source('web', 'tracks') }}\n    {%- if is_incremental() %}\n    where received_at"
        ));
        assert!(sql.contains("    {%- endif %}\n\n),"));
    }
}
