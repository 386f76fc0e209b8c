//! Entity metadata
//!
//! Declarations emitted by `#[derive(Entity)]` are plain data
//! ([`EntityAnnotations`]); [`EntityMetadata::from_annotations`] validates them
//! into descriptors, and [`EntityRegistry`] caches the result per type.

pub mod attributes;
pub mod descriptor;
pub mod field;
pub mod naming;
pub mod registry;
pub mod relationships;
pub mod types;

pub use attributes::{
    EntityAnnotations, EntityAttribute, FieldAttribute, JoinTableAttribute, PropertyAnnotations,
    RelationshipAttribute,
};
pub use descriptor::{EntityDescriptor, EntityMetadata, PropertyInfo};
pub use field::FieldDescriptor;
pub use registry::{EntityFactory, EntityRegistry};
pub use relationships::{JoinTable, RelationshipDescriptor, RelationshipKind};
pub use types::{SemanticType, UnknownSemanticType};
