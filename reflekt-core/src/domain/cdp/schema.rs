// reflekt-core/src/domain/cdp/schema.rs
//
// JSON Schema fragments shared by the CDP dialects: one property <-> one
// `{description, type, ...}` node, and a list of properties <-> a
// `{type: object, properties, required}` block.

use serde_json::{Map, Value, json};
use tracing::debug;

use crate::domain::error::DomainError;
use crate::domain::plan::property::{
    DataType, MAX_PROPERTY_DEPTH, Property, PropertyKind, RawProperty,
};

pub const JSON_SCHEMA_DRAFT: &str = "http://json-schema.org/draft-07/schema#";

// --- Canonical -> CDP ---

/// One property as a JSON Schema node.
///
/// Only the first matching rule survives, in this order: nullability,
/// `any`, `pattern`, `enum`, `datetime`. A nullable enum therefore loses
/// its enum in the payload.
pub fn property_to_schema(prop: &Property) -> Value {
    let mut node = Map::new();
    node.insert("description".into(), json!(prop.description()));

    let base = json!(prop.data_type().as_str());
    let format = match prop.kind() {
        PropertyKind::String(format) => Some(format),
        _ => None,
    };

    if prop.allow_null() {
        node.insert("type".into(), json!([base, "null"]));
    } else if prop.data_type() == DataType::Any {
        // no constraint: the `type` key is omitted
    } else {
        node.insert("type".into(), json!([base]));
        if let Some(pattern) = format.and_then(|f| f.pattern.as_ref()) {
            node.insert("pattern".into(), json!(pattern));
        } else if let Some(values) = format.and_then(|f| f.enum_values.as_ref()) {
            node.insert("enum".into(), json!(values));
        } else if format.and_then(|f| f.datetime) == Some(true) {
            node.insert("format".into(), json!("date-time"));
        }
    }

    match prop.kind() {
        PropertyKind::Array(items) if !items.is_empty() => {
            node.insert("items".into(), object_block(items));
        }
        PropertyKind::Object(members) if !members.is_empty() => {
            let block = object_block(members);
            if let Value::Object(block) = block {
                for key in ["properties", "required"] {
                    if let Some(v) = block.get(key) {
                        node.insert(key.into(), v.clone());
                    }
                }
            }
        }
        _ => {}
    }

    Value::Object(node)
}

/// `{type: object, properties: {...}, required: [...]}`
pub fn object_block(props: &[Property]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for prop in props {
        properties.insert(prop.name().to_string(), property_to_schema(prop));
        if prop.required() {
            required.push(json!(prop.name()));
        }
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

// --- CDP -> canonical ---

/// Reads a `{properties, required}` block back into raw properties, sorted
/// by name.
pub fn block_to_raw_properties(
    block: &Value,
    location: &str,
    depth: usize,
) -> Result<Vec<RawProperty>, DomainError> {
    if depth > MAX_PROPERTY_DEPTH {
        return Err(DomainError::ApiResponse(format!(
            "schema at '{}' is nested more than {} levels",
            location, MAX_PROPERTY_DEPTH
        )));
    }

    let properties = match block.get("properties") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Object(map)) => map,
        Some(other) => {
            return Err(DomainError::ApiResponse(format!(
                "'properties' at '{}' must be an object, got {}",
                location, other
            )));
        }
    };
    let required: Vec<&str> = block
        .get("required")
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let mut names: Vec<&String> = properties.keys().collect();
    names.sort();

    names
        .into_iter()
        .map(|name| {
            let node = &properties[name.as_str()];
            schema_to_raw_property(
                name,
                node,
                required.contains(&name.as_str()),
                &format!("{}.{}", location, name),
                depth,
            )
        })
        .collect()
}

pub fn schema_to_raw_property(
    name: &str,
    node: &Value,
    required: bool,
    location: &str,
    depth: usize,
) -> Result<RawProperty, DomainError> {
    if !node.is_object() {
        return Err(DomainError::ApiResponse(format!(
            "property '{}' must be a JSON object",
            location
        )));
    }

    // 1. type: string | [types] | absent
    let mut types: Vec<String> = match node.get("type") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(t)) => vec![t.clone()],
        Some(Value::Array(list)) => list
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(other) => {
            return Err(DomainError::ApiResponse(format!(
                "unsupported 'type' {} for property '{}'",
                other, location
            )));
        }
    };
    let had_null = types.iter().any(|t| t == "null");
    types.retain(|t| t != "null");

    let kind = match types.as_slice() {
        [] if had_null => DataType::Null,
        [] => DataType::Any,
        [single] => single.parse::<DataType>().map_err(|e| {
            DomainError::ApiResponse(format!("property '{}': {}", location, e))
        })?,
        many => {
            debug!(property = %location, types = ?many, "Type union collapsed to 'any'");
            DataType::Any
        }
    };

    let mut raw = RawProperty {
        name: name.to_string(),
        description: node
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        kind: kind.as_str().to_string(),
        required,
        allow_null: had_null && kind != DataType::Null,
        ..Default::default()
    };

    // 2. String formats
    if kind == DataType::String {
        if let Some(values) = node.get("enum").and_then(Value::as_array) {
            let non_null: Vec<Value> = values.iter().filter(|v| !v.is_null()).cloned().collect();
            if non_null.len() != values.len() {
                raw.allow_null = true;
            }
            raw.enum_values = Some(non_null);
        }
        if let Some(pattern) = node.get("pattern").and_then(Value::as_str) {
            raw.pattern = Some(pattern.to_string());
        }
        if node.get("format").and_then(Value::as_str) == Some("date-time") {
            raw.datetime = Some(true);
        }
    }

    // 3. Nested
    match kind {
        DataType::Array => {
            if let Some(items) = node.get("items") {
                let children = block_to_raw_properties(items, location, depth + 1)?;
                if !children.is_empty() {
                    raw.array_item_schema = Some(children);
                }
            }
        }
        DataType::Object => {
            let children = block_to_raw_properties(node, location, depth + 1)?;
            if !children.is_empty() {
                raw.object_properties = Some(children);
            }
        }
        _ => {}
    }

    Ok(raw)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::project::Conventions;

    fn build(raw: &RawProperty) -> Property {
        Property::from_raw(raw, "e.properties", &Conventions::default()).unwrap()
    }

    #[test]
    fn test_nullable_round_trip_keeps_base_type() -> anyhow::Result<()> {
        let mut raw = RawProperty::new("total", "Cart total", DataType::Number);
        raw.allow_null = true;
        raw.required = true;
        let prop = build(&raw);

        let node = property_to_schema(&prop);
        assert_eq!(node["type"], json!(["number", "null"]));

        let back = schema_to_raw_property("total", &node, true, "e.total", 0)?;
        assert!(back.allow_null);
        assert_eq!(back.kind, "number");
        assert_eq!(build(&back), prop);
        Ok(())
    }

    #[test]
    fn test_first_match_wins() {
        let mut raw = RawProperty::new("currency", "Currency", DataType::String);
        raw.enum_values = Some(vec![json!("EUR")]);
        raw.allow_null = true;
        let node = property_to_schema(&build(&raw));
        assert!(node.get("enum").is_none());

        raw.allow_null = false;
        raw.pattern = Some("^[A-Z]{3}$".to_string());
        raw.datetime = Some(true);
        let node = property_to_schema(&build(&raw));
        assert_eq!(node["pattern"], json!("^[A-Z]{3}$"));
        assert!(node.get("enum").is_none());
        assert!(node.get("format").is_none());
    }

    #[test]
    fn test_any_omits_type() {
        let node = property_to_schema(&build(&RawProperty::new("payload", "d", DataType::Any)));
        assert!(node.get("type").is_none());
    }

    #[test]
    fn test_datetime_becomes_format() -> anyhow::Result<()> {
        let mut raw = RawProperty::new("ordered_at", "d", DataType::String);
        raw.datetime = Some(true);
        let node = property_to_schema(&build(&raw));
        assert_eq!(node["format"], json!("date-time"));

        let back = schema_to_raw_property("ordered_at", &node, false, "e", 0)?;
        assert_eq!(back.datetime, Some(true));
        Ok(())
    }

    #[test]
    fn test_array_items_and_object_members() {
        let mut products = RawProperty::new("products", "d", DataType::Array);
        let mut sku = RawProperty::new("sku", "d", DataType::String);
        sku.required = true;
        products.array_item_schema = Some(vec![sku, RawProperty::new("price", "d", DataType::Number)]);
        let node = property_to_schema(&build(&products));
        assert_eq!(node["items"]["type"], json!("object"));
        assert_eq!(node["items"]["required"], json!(["sku"]));
        assert!(node["items"]["properties"]["price"].is_object());

        let mut address = RawProperty::new("address", "d", DataType::Object);
        address.object_properties = Some(vec![RawProperty::new("city", "d", DataType::String)]);
        let node = property_to_schema(&build(&address));
        assert_eq!(node["properties"]["city"]["type"], json!(["string"]));
        assert_eq!(node["required"], json!([]));
    }

    #[test]
    fn test_pull_collapses_type_arrays() -> anyhow::Result<()> {
        let only_null = json!({ "description": "d", "type": ["null"] });
        assert_eq!(schema_to_raw_property("x", &only_null, false, "x", 0)?.kind, "null");

        let union = json!({ "description": "d", "type": ["string", "integer", "null"] });
        let raw = schema_to_raw_property("x", &union, false, "x", 0)?;
        assert_eq!(raw.kind, "any");
        assert!(raw.allow_null);

        let scalar = json!({ "description": "d", "type": "boolean" });
        assert_eq!(schema_to_raw_property("x", &scalar, false, "x", 0)?.kind, "boolean");
        Ok(())
    }

    #[test]
    fn test_pull_strips_null_from_enum() -> anyhow::Result<()> {
        let node = json!({ "description": "d", "type": ["string"], "enum": ["a", null, "b"] });
        let raw = schema_to_raw_property("x", &node, false, "x", 0)?;
        assert_eq!(raw.enum_values, Some(vec![json!("a"), json!("b")]));
        assert!(raw.allow_null);
        Ok(())
    }

    #[test]
    fn test_pull_rejects_malformed_nodes() {
        let err = schema_to_raw_property("x", &json!("string"), false, "x", 0).unwrap_err();
        assert!(matches!(err, DomainError::ApiResponse(_)));

        let err = block_to_raw_properties(&json!({ "properties": [] }), "x", 0).unwrap_err();
        assert!(matches!(err, DomainError::ApiResponse(_)));
    }
}
