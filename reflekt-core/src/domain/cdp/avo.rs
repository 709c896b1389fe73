// reflekt-core/src/domain/cdp/avo.rs
//
// Avo tracking plan export. Pull only; Avo has no trait rules and no event
// versions, and carries metadata as free-text tags.

use serde_json::Value;
use std::collections::BTreeMap;

use super::schema::block_to_raw_properties;
use crate::domain::error::DomainError;
use crate::domain::plan::{RawEvent, RawPlan};

/// Key for tags that are not `key: value` pairs.
pub const FREE_TAGS_KEY: &str = "tags";

pub fn payload_to_raw_plan(payload: &Value, plan_name: &str) -> Result<RawPlan, DomainError> {
    let events = payload
        .get("events")
        .and_then(Value::as_array)
        .ok_or_else(|| DomainError::ApiResponse("missing 'events' array in Avo export".into()))?;

    let events = events
        .iter()
        .enumerate()
        .map(|(i, e)| event_from_export(e, i))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RawPlan {
        name: plan_name.to_string(),
        events,
        user_traits: Vec::new(),
        group_traits: Vec::new(),
    })
}

fn event_from_export(event: &Value, index: usize) -> Result<RawEvent, DomainError> {
    let name = event
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| DomainError::ApiResponse(format!("Avo event #{} has no 'name'", index)))?;

    let properties = event
        .get("rules")
        .and_then(|r| r.get("properties"))
        .and_then(|p| p.get("properties"))
        .ok_or_else(|| {
            DomainError::ApiResponse(format!(
                "Avo event '{}' has no 'rules.properties.properties'",
                name
            ))
        })?;

    let tags: Vec<&str> = event
        .get("tags")
        .and_then(Value::as_array)
        .map(|t| t.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    Ok(RawEvent {
        name: name.to_string(),
        version: 1,
        description: event
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        metadata: tags_to_metadata(&tags),
        properties: block_to_raw_properties(properties, &format!("{}.properties", name), 0)?,
    })
}

/// `"owner: Alice"` becomes `owner -> "Alice"`; other tags are listed under `tags`.
pub fn tags_to_metadata(tags: &[&str]) -> BTreeMap<String, Value> {
    let mut metadata = BTreeMap::new();
    let mut free = Vec::new();

    for tag in tags {
        match tag.split_once(':') {
            Some((key, value)) if !key.trim().is_empty() => {
                metadata.insert(key.trim().to_string(), Value::String(value.trim().to_string()));
            }
            _ => free.push(Value::String(tag.trim().to_string())),
        }
    }

    if !free.is_empty() {
        metadata.insert(FREE_TAGS_KEY.to_string(), Value::Array(free));
    }
    metadata
}
