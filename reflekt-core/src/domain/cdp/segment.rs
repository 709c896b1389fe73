// reflekt-core/src/domain/cdp/segment.rs
//
// Segment Protocols tracking plan payloads.

use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

use super::schema::{JSON_SCHEMA_DRAFT, block_to_raw_properties, object_block};
use crate::domain::error::DomainError;
use crate::domain::plan::{Event, Plan, Property, RawEvent, RawPlan};

pub fn plan_to_payload(plan: &Plan) -> Value {
    let events: Vec<Value> = plan.events().iter().map(event_to_payload).collect();

    let mut rules = Map::new();
    rules.insert("events".into(), Value::Array(events));
    if !plan.user_traits().is_empty() {
        rules.insert("identify".into(), traits_rules(plan.user_traits()));
    }
    if !plan.group_traits().is_empty() {
        rules.insert("group".into(), traits_rules(plan.group_traits()));
    }

    json!({
        "display_name": plan.name(),
        "rules": rules,
    })
}

fn event_to_payload(event: &Event) -> Value {
    let mut rules = Map::new();
    rules.insert("$schema".into(), json!(JSON_SCHEMA_DRAFT));
    rules.insert("type".into(), json!("object"));
    if !event.metadata().is_empty() {
        let labels: Map<String, Value> = event
            .metadata()
            .iter()
            .map(|(k, v)| (k.clone(), json!(label_value(v))))
            .collect();
        rules.insert("labels".into(), Value::Object(labels));
    }
    rules.insert(
        "properties".into(),
        json!({
            "context": {},
            "traits": {},
            "properties": object_block(event.properties()),
        }),
    );
    rules.insert("required".into(), json!(["properties"]));

    json!({
        "name": event.name(),
        "description": event.description(),
        "version": event.version(),
        "rules": rules,
    })
}

fn traits_rules(traits: &[Property]) -> Value {
    json!({
        "$schema": JSON_SCHEMA_DRAFT,
        "type": "object",
        "properties": {
            "traits": object_block(traits),
        },
    })
}

/// Segment labels are strings.
fn label_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// --- Pull ---

pub fn payload_to_raw_plan(payload: &Value, fallback_name: &str) -> Result<RawPlan, DomainError> {
    // The API wraps the plan in `tracking_plan`; exports do not.
    let root = payload.get("tracking_plan").unwrap_or(payload);

    let rules = root
        .get("rules")
        .ok_or_else(|| DomainError::ApiResponse("missing 'rules' in Segment tracking plan".into()))?;
    let events = rules
        .get("events")
        .and_then(Value::as_array)
        .ok_or_else(|| DomainError::ApiResponse("missing 'rules.events' array".into()))?;

    let name = root
        .get("display_name")
        .and_then(Value::as_str)
        .filter(|n| !n.is_empty())
        .unwrap_or(fallback_name)
        .to_string();

    let events = events
        .iter()
        .enumerate()
        .map(|(i, e)| event_from_payload(e, i))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RawPlan {
        name,
        events,
        user_traits: traits_from_rules(rules.get("identify"), "identify")?,
        group_traits: traits_from_rules(rules.get("group"), "group")?,
    })
}

fn event_from_payload(event: &Value, index: usize) -> Result<RawEvent, DomainError> {
    let name = event
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| DomainError::ApiResponse(format!("event #{} has no 'name'", index)))?;

    let rules = event
        .get("rules")
        .ok_or_else(|| DomainError::ApiResponse(format!("event '{}' has no 'rules'", name)))?;
    let properties = rules
        .get("properties")
        .and_then(|p| p.get("properties"))
        .ok_or_else(|| {
            DomainError::ApiResponse(format!(
                "event '{}' has no 'rules.properties.properties'",
                name
            ))
        })?;

    let version = match event.get("version") {
        None | Some(Value::Null) => 1,
        Some(v) => v
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| {
                DomainError::ApiResponse(format!("event '{}' has an invalid version {}", name, v))
            })?,
    };

    let metadata: BTreeMap<String, Value> = rules
        .get("labels")
        .and_then(Value::as_object)
        .map(|labels| labels.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default();

    Ok(RawEvent {
        name: name.to_string(),
        version,
        description: event
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        metadata,
        properties: block_to_raw_properties(properties, &format!("{}.properties", name), 0)?,
    })
}

fn traits_from_rules(
    rules: Option<&Value>,
    call: &str,
) -> Result<Vec<crate::domain::plan::RawProperty>, DomainError> {
    let Some(rules) = rules else {
        return Ok(Vec::new());
    };
    match rules.get("properties").and_then(|p| p.get("traits")) {
        Some(traits) => block_to_raw_properties(traits, &format!("{}.traits", call), 0),
        None => Ok(Vec::new()),
    }
}
