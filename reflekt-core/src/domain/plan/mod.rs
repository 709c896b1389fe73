// reflekt-core/src/domain/plan/mod.rs

pub mod event;
pub mod metadata;
#[allow(clippy::module_inception)]
pub mod plan;
pub mod property;

pub use event::{Event, RawEvent};
pub use metadata::MetadataSchema;
pub use plan::{Plan, RawPlan};
pub use property::{DataType, Property, PropertyKind, RawProperty, StringFormat};
