// reflekt-core/src/domain/plan/property.rs
//
// A property is any typed attribute of the plan: event property, user or group
// trait, array item, object member. `RawProperty` is the authored shape,
// `Property` the validated one.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::domain::error::DomainError;
use crate::domain::project::Conventions;

/// Nesting bound for array items / object members.
pub const MAX_PROPERTY_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
    Any,
    Null,
}

impl DataType {
    pub const ALL: [DataType; 8] = [
        DataType::String,
        DataType::Integer,
        DataType::Number,
        DataType::Boolean,
        DataType::Object,
        DataType::Array,
        DataType::Any,
        DataType::Null,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::Any => "any",
            Self::Null => "null",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown type '{}'", s))
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

// --- RAW (AUTHORED) SHAPE ---

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RawProperty {
    #[validate(length(min = 1, message = "name cannot be empty"))]
    pub name: String,

    #[validate(length(min = 1, message = "description cannot be empty"))]
    pub description: String,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub allow_null: bool,

    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_item_schema: Option<Vec<RawProperty>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_properties: Option<Vec<RawProperty>>,
}

impl RawProperty {
    pub fn new(name: impl Into<String>, description: impl Into<String>, kind: DataType) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind: kind.as_str().to_string(),
            ..Default::default()
        }
    }
}

// --- VALIDATED SHAPE ---

/// Constraints only a string property may carry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StringFormat {
    pub enum_values: Option<Vec<Value>>,
    pub pattern: Option<String>,
    pub datetime: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKind {
    String(StringFormat),
    Integer,
    Number,
    Boolean,
    Null,
    Any,
    Array(Vec<Property>),
    Object(Vec<Property>),
}

impl PropertyKind {
    pub fn data_type(&self) -> DataType {
        match self {
            Self::String(_) => DataType::String,
            Self::Integer => DataType::Integer,
            Self::Number => DataType::Number,
            Self::Boolean => DataType::Boolean,
            Self::Null => DataType::Null,
            Self::Any => DataType::Any,
            Self::Array(_) => DataType::Array,
            Self::Object(_) => DataType::Object,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    name: String,
    description: String,
    required: bool,
    allow_null: bool,
    kind: PropertyKind,
}

impl Property {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn required(&self) -> bool {
        self.required
    }

    pub fn allow_null(&self) -> bool {
        self.allow_null
    }

    pub fn kind(&self) -> &PropertyKind {
        &self.kind
    }

    pub fn data_type(&self) -> DataType {
        self.kind.data_type()
    }

    /// Builds a property from an untyped fragment (YAML or JSON).
    pub fn from_value(
        value: &Value,
        parent: &str,
        conventions: &Conventions,
    ) -> Result<Self, DomainError> {
        let raw: RawProperty = serde_json::from_value(value.clone()).map_err(|e| {
            let name = value.get("name").and_then(Value::as_str).unwrap_or("<unnamed>");
            DomainError::validation(format!("{}.{}", parent, name), "schema", e.to_string())
        })?;
        Self::from_raw(&raw, parent, conventions)
    }

    /// Validates `raw` and builds the property. `parent` is the dotted
    /// location of the container (e.g. `Cart Viewed.properties`).
    pub fn from_raw(
        raw: &RawProperty,
        parent: &str,
        conventions: &Conventions,
    ) -> Result<Self, DomainError> {
        Self::build(raw, parent, conventions, 0)
    }

    fn build(
        raw: &RawProperty,
        parent: &str,
        conventions: &Conventions,
        depth: usize,
    ) -> Result<Self, DomainError> {
        let path = format!("{}.{}", parent, raw.name);

        if depth > MAX_PROPERTY_DEPTH {
            return Err(DomainError::validation(
                path,
                "depth",
                format!("properties cannot be nested more than {} levels", MAX_PROPERTY_DEPTH),
            ));
        }

        // 1. Structural check
        if let Err(errors) = raw.validate() {
            let field = errors
                .field_errors()
                .keys()
                .next()
                .map(|k| k.to_string())
                .unwrap_or_else(|| "schema".to_string());
            return Err(DomainError::validation(path, field, errors.to_string()));
        }
        let data_type: DataType = raw
            .kind
            .parse()
            .map_err(|e: String| DomainError::validation(&path, "type", e))?;
        if !conventions.allows_type(data_type) {
            return Err(DomainError::validation(
                &path,
                "type",
                format!("type '{}' is not allowed by the project conventions", data_type),
            ));
        }

        // 2. Naming convention
        conventions.property.enforce(&path, &raw.name)?;
        conventions.property.enforce_not_reserved(&path, &raw.name)?;

        // 3. Type-dependent fields
        check_exclusivity(raw, data_type, &path)?;

        if let Some(pattern) = &raw.pattern {
            Regex::new(pattern).map_err(|e| {
                DomainError::validation(&path, "pattern", format!("invalid regular expression: {}", e))
            })?;
        }

        // 4. Nested members
        let kind = match data_type {
            DataType::String => PropertyKind::String(StringFormat {
                enum_values: raw.enum_values.clone(),
                pattern: raw.pattern.clone(),
                datetime: raw.datetime,
            }),
            DataType::Integer => PropertyKind::Integer,
            DataType::Number => PropertyKind::Number,
            DataType::Boolean => PropertyKind::Boolean,
            DataType::Null => PropertyKind::Null,
            DataType::Any => PropertyKind::Any,
            DataType::Array => PropertyKind::Array(Self::build_children(
                raw.array_item_schema.as_deref(),
                &format!("{}.array_item_schema", path),
                conventions,
                depth,
            )?),
            DataType::Object => PropertyKind::Object(Self::build_children(
                raw.object_properties.as_deref(),
                &format!("{}.object_properties", path),
                conventions,
                depth,
            )?),
        };

        Ok(Self {
            name: raw.name.clone(),
            description: raw.description.clone(),
            required: raw.required,
            allow_null: raw.allow_null,
            kind,
        })
    }

    fn build_children(
        children: Option<&[RawProperty]>,
        parent: &str,
        conventions: &Conventions,
        depth: usize,
    ) -> Result<Vec<Property>, DomainError> {
        children
            .unwrap_or_default()
            .iter()
            .map(|child| Self::build(child, parent, conventions, depth + 1))
            .collect()
    }

    pub fn to_raw(&self) -> RawProperty {
        let mut raw = RawProperty {
            name: self.name.clone(),
            description: self.description.clone(),
            kind: self.data_type().as_str().to_string(),
            required: self.required,
            allow_null: self.allow_null,
            ..Default::default()
        };

        match &self.kind {
            PropertyKind::String(format) => {
                raw.enum_values = format.enum_values.clone();
                raw.pattern = format.pattern.clone();
                raw.datetime = format.datetime;
            }
            PropertyKind::Array(items) if !items.is_empty() => {
                raw.array_item_schema = Some(items.iter().map(Property::to_raw).collect());
            }
            PropertyKind::Object(members) if !members.is_empty() => {
                raw.object_properties = Some(members.iter().map(Property::to_raw).collect());
            }
            _ => {}
        }
        raw
    }
}

fn check_exclusivity(raw: &RawProperty, data_type: DataType, path: &str) -> Result<(), DomainError> {
    if data_type != DataType::String {
        let string_only = [
            ("enum", raw.enum_values.is_some()),
            ("pattern", raw.pattern.is_some()),
            ("datetime", raw.datetime == Some(true)),
        ];
        if let Some((field, _)) = string_only.iter().find(|(_, set)| *set) {
            return Err(DomainError::validation(
                path,
                *field,
                format!("'{}' is only valid for type 'string' (got '{}')", field, data_type),
            ));
        }
    }

    if data_type != DataType::Array && raw.array_item_schema.is_some() {
        return Err(DomainError::validation(
            path,
            "array_item_schema",
            format!("'array_item_schema' is only valid for type 'array' (got '{}')", data_type),
        ));
    }

    if data_type != DataType::Object && raw.object_properties.is_some() {
        return Err(DomainError::validation(
            path,
            "object_properties",
            format!("'object_properties' is only valid for type 'object' (got '{}')", data_type),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn conventions() -> Conventions {
        Conventions::default()
    }

    fn field_of(err: DomainError) -> String {
        match err {
            DomainError::Validation { field, .. } => field,
            other => panic!("expected a validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_string_property_with_enum() -> anyhow::Result<()> {
        let value = json!({
            "name": "currency",
            "description": "ISO currency",
            "type": "string",
            "required": true,
            "enum": ["EUR", "USD"]
        });
        let prop = Property::from_value(&value, "Order Completed.properties", &conventions())?;

        assert_eq!(prop.name(), "currency");
        assert!(prop.required());
        match prop.kind() {
            PropertyKind::String(format) => {
                assert_eq!(format.enum_values, Some(vec![json!("EUR"), json!("USD")]));
            }
            other => panic!("unexpected kind {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_string_only_fields_rejected_on_other_types() {
        for (field, extra) in [
            ("enum", json!(["a"])),
            ("pattern", json!("^a$")),
            ("datetime", json!(true)),
        ] {
            let mut value = json!({ "name": "total", "description": "d", "type": "number" });
            value[field] = extra;
            let err = Property::from_value(&value, "e.properties", &conventions()).unwrap_err();
            assert_eq!(field_of(err), field);
        }
    }

    #[test]
    fn test_nested_schemas_require_matching_type() {
        let value = json!({
            "name": "items",
            "description": "d",
            "type": "object",
            "array_item_schema": [{ "name": "sku", "description": "d", "type": "string" }]
        });
        let err = Property::from_value(&value, "e.properties", &conventions()).unwrap_err();
        assert_eq!(field_of(err), "array_item_schema");
    }

    #[test]
    fn test_datetime_false_allowed_on_other_types() -> anyhow::Result<()> {
        let value = json!({ "name": "count", "description": "d", "type": "integer", "datetime": false });
        let prop = Property::from_value(&value, "e.properties", &conventions())?;
        assert_eq!(prop.data_type(), DataType::Integer);

        let value = json!({ "name": "count", "description": "d", "type": "integer", "datetime": true });
        let err = Property::from_value(&value, "e.properties", &conventions()).unwrap_err();
        assert_eq!(field_of(err), "datetime");
        Ok(())
    }

    #[test]
    fn test_object_properties_require_object_type() {
        let value = json!({
            "name": "address",
            "description": "d",
            "type": "string",
            "object_properties": [{ "name": "city", "description": "d", "type": "string" }]
        });
        let err = Property::from_value(&value, "e.properties", &conventions()).unwrap_err();
        assert_eq!(field_of(err), "object_properties");
    }

    #[test]
    fn test_empty_description_is_structural_error() {
        let raw = RawProperty::new("cart_id", "", DataType::String);
        let err = Property::from_raw(&raw, "e.properties", &conventions()).unwrap_err();
        assert_eq!(field_of(err), "description");
    }

    #[test]
    fn test_unknown_type_and_unknown_key() {
        let bad_type = json!({ "name": "x", "description": "d", "type": "float" });
        let err = Property::from_value(&bad_type, "e.properties", &conventions()).unwrap_err();
        assert_eq!(field_of(err), "type");

        let unknown = json!({ "name": "x", "description": "d", "type": "string", "color": "red" });
        let err = Property::from_value(&unknown, "e.properties", &conventions()).unwrap_err();
        assert_eq!(field_of(err), "schema");
    }

    #[test]
    fn test_disallowed_data_type() {
        let mut conv = conventions();
        conv.data_types.retain(|t| *t != DataType::Any);
        let raw = RawProperty::new("payload", "d", DataType::Any);
        let err = Property::from_raw(&raw, "e.properties", &conv).unwrap_err();
        assert_eq!(field_of(err), "type");
    }

    #[test]
    fn test_naming_convention_applies_to_properties() {
        let bad = RawProperty::new("myProp2", "d", DataType::String);
        let err = Property::from_raw(&bad, "e.properties", &conventions()).unwrap_err();
        assert!(matches!(err, DomainError::NamingConvention { .. }));

        let good = RawProperty::new("my_prop", "d", DataType::String);
        assert!(Property::from_raw(&good, "e.properties", &conventions()).is_ok());
    }

    #[test]
    fn test_nested_error_path_is_dotted() {
        let value = json!({
            "name": "products",
            "description": "d",
            "type": "array",
            "array_item_schema": [
                { "name": "price", "description": "d", "type": "number", "pattern": "x" }
            ]
        });
        let err = Property::from_value(&value, "Cart Viewed.properties", &conventions()).unwrap_err();
        match err {
            DomainError::Validation { path, field, .. } => {
                assert_eq!(path, "Cart Viewed.properties.products.array_item_schema.price");
                assert_eq!(field, "pattern");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let mut raw = RawProperty::new("code", "d", DataType::String);
        raw.pattern = Some("([a-z".to_string());
        let err = Property::from_raw(&raw, "e.properties", &conventions()).unwrap_err();
        assert_eq!(field_of(err), "pattern");
    }

    #[test]
    fn test_depth_is_bounded() {
        let mut raw = RawProperty::new("leaf", "d", DataType::String);
        for _ in 0..=MAX_PROPERTY_DEPTH {
            let mut parent = RawProperty::new("node", "d", DataType::Object);
            parent.object_properties = Some(vec![raw]);
            raw = parent;
        }
        let err = Property::from_raw(&raw, "e.properties", &conventions()).unwrap_err();
        assert_eq!(field_of(err), "depth");
    }

    #[test]
    fn test_to_raw_preserves_the_fragment() -> anyhow::Result<()> {
        let value = json!({
            "name": "products",
            "description": "Cart content",
            "type": "array",
            "allow_null": true,
            "array_item_schema": [
                { "name": "sku", "description": "SKU", "type": "string", "required": true, "pattern": "^[A-Z]+$" }
            ]
        });
        let prop = Property::from_value(&value, "e.properties", &conventions())?;
        let back = serde_json::to_value(prop.to_raw())?;
        assert_eq!(back, value);
        Ok(())
    }
}
