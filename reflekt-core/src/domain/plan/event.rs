// reflekt-core/src/domain/plan/event.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use validator::Validate;

use super::property::{Property, RawProperty};
use crate::domain::error::DomainError;
use crate::domain::project::Conventions;

fn default_version() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RawEvent {
    #[validate(length(min = 1, message = "name cannot be empty"))]
    pub name: String,

    #[serde(default = "default_version")]
    #[validate(range(min = 1, message = "version must be >= 1"))]
    pub version: u32,

    #[validate(length(min = 1, message = "description cannot be empty"))]
    pub description: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,

    #[serde(default)]
    pub properties: Vec<RawProperty>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    name: String,
    version: u32,
    description: String,
    metadata: BTreeMap<String, Value>,
    properties: Vec<Property>,
}

impl Event {
    /// Event without properties. Name, version, description and metadata
    /// are checked here; properties are appended by the loader.
    pub fn new(
        name: impl Into<String>,
        version: u32,
        description: impl Into<String>,
        metadata: BTreeMap<String, Value>,
        conventions: &Conventions,
    ) -> Result<Self, DomainError> {
        let raw = RawEvent {
            name: name.into(),
            version,
            description: description.into(),
            metadata,
            properties: Vec::new(),
        };
        Self::header(raw, conventions)
    }

    fn header(raw: RawEvent, conventions: &Conventions) -> Result<Self, DomainError> {
        let path = if raw.name.is_empty() {
            "<unnamed event>".to_string()
        } else {
            raw.name.clone()
        };

        if let Err(errors) = raw.validate() {
            let field = errors
                .field_errors()
                .keys()
                .next()
                .map(|k| k.to_string())
                .unwrap_or_else(|| "schema".to_string());
            return Err(DomainError::validation(path, field, errors.to_string()));
        }

        conventions.event.enforce(&path, &raw.name)?;

        if let Some(schema) = &conventions.metadata_schema {
            schema.check(&path, &raw.metadata)?;
        }

        Ok(Self {
            name: raw.name,
            version: raw.version,
            description: raw.description,
            metadata: raw.metadata,
            properties: Vec::new(),
        })
    }

    pub fn from_raw(raw: &RawEvent, conventions: &Conventions) -> Result<Self, DomainError> {
        let mut header = raw.clone();
        header.properties = Vec::new();
        let mut event = Self::header(header, conventions)?;

        let parent = format!("{}.properties", event.name);
        for raw_prop in &raw.properties {
            event.add_property(Property::from_raw(raw_prop, &parent, conventions)?);
        }
        Ok(event)
    }

    /// Append only. Uniqueness is checked by `validate`.
    pub fn add_property(&mut self, property: Property) {
        self.properties.push(property);
    }

    pub fn validate(&self, conventions: &Conventions) -> Result<(), DomainError> {
        let parent = format!("{}.properties", self.name);
        for prop in &self.properties {
            conventions
                .property
                .enforce_not_reserved(&format!("{}.{}", parent, prop.name()), prop.name())?;
        }

        let duplicates = repeated(self.properties.iter().map(|p| p.name().to_string()));
        if !duplicates.is_empty() {
            return Err(DomainError::Duplicate {
                kind: "property".to_string(),
                scope: self.label(),
                duplicates,
            });
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// `Cart Viewed (v1)`
    pub fn label(&self) -> String {
        format!("{} (v{})", self.name, self.version)
    }

    pub fn to_raw(&self) -> RawEvent {
        RawEvent {
            name: self.name.clone(),
            version: self.version,
            description: self.description.clone(),
            metadata: self.metadata.clone(),
            properties: self.properties.iter().map(Property::to_raw).collect(),
        }
    }
}

/// Every occurrence of every key seen more than once, in input order.
pub(crate) fn repeated<I>(keys: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let keys: Vec<String> = keys.into_iter().collect();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for key in &keys {
        *counts.entry(key.as_str()).or_insert(0) += 1;
    }
    keys.iter()
        .filter(|k| counts.get(k.as_str()).copied().unwrap_or(0) > 1)
        .cloned()
        .collect()
}
