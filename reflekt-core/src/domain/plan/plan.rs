// reflekt-core/src/domain/plan/plan.rs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use super::event::{Event, RawEvent, repeated};
use super::property::{Property, RawProperty};
use crate::domain::error::DomainError;
use crate::domain::project::Conventions;

/// Pre-validation tree of a whole plan, as read from disk or pulled from a CDP.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawPlan {
    pub name: String,
    #[serde(default)]
    pub events: Vec<RawEvent>,
    #[serde(default)]
    pub user_traits: Vec<RawProperty>,
    #[serde(default)]
    pub group_traits: Vec<RawProperty>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    name: String,
    events: Vec<Event>,
    user_traits: Vec<Property>,
    group_traits: Vec<Property>,
}

impl Plan {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            events: Vec::new(),
            user_traits: Vec::new(),
            group_traits: Vec::new(),
        }
    }

    // --- Accumulation (loader side) ---

    pub fn add_event(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn add_user_trait(&mut self, property: Property) {
        self.user_traits.push(property);
    }

    pub fn add_group_trait(&mut self, property: Property) {
        self.group_traits.push(property);
    }

    /// Builds every child from `raw`. Whole-plan checks are left to `validate`.
    pub fn from_raw(raw: &RawPlan, conventions: &Conventions) -> Result<Self, DomainError> {
        if raw.name.trim().is_empty() {
            return Err(DomainError::validation("plan", "name", "plan name cannot be empty"));
        }
        let mut plan = Plan::new(raw.name.clone());

        for raw_event in &raw.events {
            plan.add_event(Event::from_raw(raw_event, conventions)?);
        }
        for raw_trait in &raw.user_traits {
            plan.add_user_trait(Property::from_raw(raw_trait, "user_traits", conventions)?);
        }
        for raw_trait in &raw.group_traits {
            plan.add_group_trait(Property::from_raw(raw_trait, "group_traits", conventions)?);
        }
        Ok(plan)
    }

    pub fn validate(&self, conventions: &Conventions) -> Result<(), DomainError> {
        debug!(plan = %self.name, events = self.events.len(), "Validating plan");

        // 1. Each event on its own
        for event in &self.events {
            event.validate(conventions)?;
            conventions.event.enforce_not_reserved(event.name(), event.name())?;
        }

        // 2. (name, version) unicity
        let duplicates = repeated(self.events.iter().map(Event::label));
        if !duplicates.is_empty() {
            return Err(DomainError::Duplicate {
                kind: "event".to_string(),
                scope: self.name.clone(),
                duplicates,
            });
        }

        // 3. Traits
        for (scope, traits) in [("user_traits", &self.user_traits), ("group_traits", &self.group_traits)] {
            for t in traits {
                conventions
                    .property
                    .enforce_not_reserved(&format!("{}.{}", scope, t.name()), t.name())?;
            }
            let duplicates = repeated(traits.iter().map(|t| t.name().to_string()));
            if !duplicates.is_empty() {
                return Err(DomainError::Duplicate {
                    kind: "trait".to_string(),
                    scope: format!("{}.{}", self.name, scope),
                    duplicates,
                });
            }
        }

        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn user_traits(&self) -> &[Property] {
        &self.user_traits
    }

    pub fn group_traits(&self) -> &[Property] {
        &self.group_traits
    }

    pub fn find_event(&self, name: &str) -> Option<&Event> {
        self.latest_events().into_iter().find(|e| e.name() == name)
    }

    /// Highest version of each event name, in order of first appearance.
    pub fn latest_events(&self) -> Vec<&Event> {
        let mut order: Vec<&str> = Vec::new();
        let mut latest: HashMap<&str, &Event> = HashMap::new();

        for event in &self.events {
            match latest.get(event.name()) {
                Some(current) if current.version() >= event.version() => {}
                Some(_) => {
                    latest.insert(event.name(), event);
                }
                None => {
                    order.push(event.name());
                    latest.insert(event.name(), event);
                }
            }
        }

        order
            .into_iter()
            .filter_map(|name| latest.get(name).copied())
            .collect()
    }

    pub fn property_count(&self) -> usize {
        self.events.iter().map(|e| e.properties().len()).sum()
    }

    pub fn to_raw(&self) -> RawPlan {
        RawPlan {
            name: self.name.clone(),
            events: self.events.iter().map(Event::to_raw).collect(),
            user_traits: self.user_traits.iter().map(Property::to_raw).collect(),
            group_traits: self.group_traits.iter().map(Property::to_raw).collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::naming::NamingRule;
    use crate::domain::plan::property::DataType;
    use std::collections::BTreeMap;

    fn event(name: &str, version: u32) -> RawEvent {
        RawEvent {
            name: name.to_string(),
            version,
            description: format!("{} event", name),
            metadata: BTreeMap::new(),
            properties: vec![RawProperty::new("cart_id", "Cart id", DataType::String)],
        }
    }

    fn raw_plan(events: Vec<RawEvent>) -> RawPlan {
        RawPlan {
            name: "shop".to_string(),
            events,
            user_traits: vec![RawProperty::new("email", "Email", DataType::String)],
            group_traits: vec![],
        }
    }

    #[test]
    fn test_duplicate_events_list_both() -> anyhow::Result<()> {
        let conv = Conventions::default();
        let plan = Plan::from_raw(
            &raw_plan(vec![event("Cart Viewed", 1), event("Cart Viewed", 1)]),
            &conv,
        )?;

        let err = plan.validate(&conv).unwrap_err();
        match &err {
            DomainError::Duplicate { kind, duplicates, .. } => {
                assert_eq!(kind, "event");
                assert_eq!(duplicates, &vec!["Cart Viewed (v1)", "Cart Viewed (v1)"]);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(err.to_string().contains("Cart Viewed (v1), Cart Viewed (v1)"));
        Ok(())
    }

    #[test]
    fn test_same_name_different_versions_is_valid() -> anyhow::Result<()> {
        let conv = Conventions::default();
        let plan = Plan::from_raw(
            &raw_plan(vec![
                event("Cart Viewed", 1),
                event("Order Completed", 1),
                event("Cart Viewed", 3),
                event("Cart Viewed", 2),
            ]),
            &conv,
        )?;
        plan.validate(&conv)?;

        let latest: Vec<(String, u32)> = plan
            .latest_events()
            .iter()
            .map(|e| (e.name().to_string(), e.version()))
            .collect();
        assert_eq!(
            latest,
            vec![("Cart Viewed".to_string(), 3), ("Order Completed".to_string(), 1)]
        );
        assert_eq!(plan.find_event("Cart Viewed").map(|e| e.version()), Some(3));
        Ok(())
    }

    #[test]
    fn test_reserved_event_name() -> anyhow::Result<()> {
        let mut conv = Conventions::default();
        conv.event = NamingRule::new(conv.event.case, false).with_reserved(["Identify"]);
        let plan = Plan::from_raw(&raw_plan(vec![event("Identify", 1)]), &conv)?;
        let err = plan.validate(&conv).unwrap_err();
        assert!(matches!(err, DomainError::NamingConvention { .. }));
        Ok(())
    }

    #[test]
    fn test_duplicate_traits() -> anyhow::Result<()> {
        let conv = Conventions::default();
        let mut raw = raw_plan(vec![]);
        raw.user_traits.push(RawProperty::new("email", "Again", DataType::String));
        let plan = Plan::from_raw(&raw, &conv)?;
        let err = plan.validate(&conv).unwrap_err();
        assert!(err.to_string().contains("Duplicate trait"));
        Ok(())
    }

    #[test]
    fn test_raw_round_trip() -> anyhow::Result<()> {
        let conv = Conventions::default();
        let raw = raw_plan(vec![event("Cart Viewed", 1)]);
        let plan = Plan::from_raw(&raw, &conv)?;
        assert_eq!(plan.to_raw(), raw);
        assert_eq!(plan.property_count(), 1);
        Ok(())
    }
}
