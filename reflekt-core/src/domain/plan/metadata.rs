// reflekt-core/src/domain/plan/metadata.rs
//
// Project-supplied schema for event metadata. Unknown keys are rejected.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::domain::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataType {
    String,
    Integer,
    Number,
    Boolean,
    List,
    Dict,
}

impl MetadataType {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::List => value.is_array(),
            Self::Dict => value.is_object(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetadataField {
    #[serde(rename = "type")]
    pub kind: MetadataType,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub allowed: Option<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataSchema {
    pub fields: BTreeMap<String, MetadataField>,
}

impl MetadataSchema {
    pub fn check(&self, path: &str, metadata: &BTreeMap<String, Value>) -> Result<(), DomainError> {
        let path = format!("{}.metadata", path);

        for (key, value) in metadata {
            let Some(field) = self.fields.get(key) else {
                return Err(DomainError::validation(&path, key, "unknown metadata key"));
            };

            if !field.kind.accepts(value) {
                return Err(DomainError::validation(
                    &path,
                    key,
                    format!("expected a value of type {:?}, got {}", field.kind, value),
                ));
            }

            if let Some(allowed) = &field.allowed {
                if !allowed.contains(value) {
                    let options: Vec<String> = allowed.iter().map(|v| v.to_string()).collect();
                    return Err(DomainError::validation(
                        &path,
                        key,
                        format!("unallowed value {} (allowed: {})", value, options.join(", ")),
                    ));
                }
            }
        }

        for (key, field) in &self.fields {
            if field.required && !metadata.contains_key(key) {
                return Err(DomainError::validation(&path, key, "required metadata key is missing"));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> MetadataSchema {
        serde_yaml::from_str(
            r#"
product_owner: { type: string, required: true }
priority: { type: integer, allowed: [1, 2, 3] }
"#,
        )
        .unwrap()
    }

    fn meta(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_conforming_metadata_passes() {
        let md = meta(&[("product_owner", json!("Alice")), ("priority", json!(2))]);
        assert!(schema().check("Cart Viewed", &md).is_ok());
    }

    #[test]
    fn test_missing_required_key() {
        let err = schema().check("Cart Viewed", &meta(&[])).unwrap_err();
        assert!(err.to_string().contains("product_owner"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let md = meta(&[("product_owner", json!("Alice")), ("team", json!("growth"))]);
        let err = schema().check("Cart Viewed", &md).unwrap_err();
        assert!(err.to_string().contains("unknown metadata key"));
    }

    #[test]
    fn test_type_and_allowed_values() {
        let wrong_type = meta(&[("product_owner", json!(12))]);
        assert!(schema().check("e", &wrong_type).is_err());

        let not_allowed = meta(&[("product_owner", json!("Alice")), ("priority", json!(7))]);
        let err = schema().check("e", &not_allowed).unwrap_err();
        assert!(err.to_string().contains("unallowed value 7"));
    }
}
