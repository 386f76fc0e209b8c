//! # elif-entity: Declarative Entity Mapping for elif.rs
//!
//! Attributes on plain structs describe how they map to table rows, and the
//! runtime converts between loosely typed rows (as a driver returns them)
//! and strongly typed entities, in both directions.
//!
//! ```ignore
//! use elif_entity::{Entity, Property, Row};
//!
//! #[derive(Debug, Default, Entity)]
//! #[entity(table = "users")]
//! pub struct User {
//!     #[id]
//!     #[field(type = "integer", auto_increment)]
//!     pub id: Property<i64>,
//!     #[field(type = "string", length = 120)]
//!     pub name: Property<String>,
//!     #[field(type = "simple_array")]
//!     pub tags: Property<Vec<String>>,
//! }
//!
//! let user = User::from_row(&Row::new().with_column("id", 7).with_column("tags", "a,b"))?;
//! let row = user.to_row()?;
//! ```
//!
//! Building blocks:
//! - [`metadata`]: semantic types, field/relationship descriptors, registry
//! - [`coercion`]: the per-type hydrate/extract rules
//! - [`hydration`]: row -> entity and entity -> row
//! - [`discovery`]: finds entity types in a source tree

extern crate self as elif_entity;

pub mod coercion;
pub mod config;
pub mod discovery;
pub mod entity;
pub mod error;
pub mod hydration;
pub mod metadata;
pub mod value;

// Re-export core traits and types
pub use coercion::{extract_value, hydrate_value, Codec, TypeCoercer};
pub use config::MappingConfig;
pub use discovery::{EntityScan, EntityScanner};
pub use entity::{Assignment, Entity, EntityObject};
pub use error::{EntityError, EntityResult, ValueError};
pub use hydration::{BatchHydration, Hydrator, RowFailure};
pub use metadata::{
    EntityAnnotations, EntityAttribute, EntityDescriptor, EntityMetadata, EntityRegistry,
    FieldAttribute, FieldDescriptor, JoinTable, JoinTableAttribute, PropertyAnnotations,
    PropertyInfo, RelationshipAttribute, RelationshipDescriptor, RelationshipKind, SemanticType,
};
pub use value::{FromValue, Property, Row, ToValue, Value};

// Derive macro re-export
pub use elif_entity_derive::Entity;

#[doc(hidden)]
pub mod __private {
    pub use serde_json::Value as JsonValue;
}
