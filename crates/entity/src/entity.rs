//! Core Entity Traits - Base definitions for mapped types
//!
//! `Entity` is the static side (identifier, declarations, metadata) and is
//! implemented by `#[derive(Entity)]`. `EntityObject` is the object-safe side
//! used when the concrete type is only known by its identifier at runtime.

use std::any::Any;
use std::fmt::Debug;

use crate::error::{EntityResult, ValueError};
use crate::hydration::Hydrator;
use crate::metadata::{EntityAnnotations, EntityMetadata, PropertyInfo};
use crate::value::{Row, Value};

/// Outcome of assigning one hydrated value to a property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    Assigned,
    /// Null for a non-nullable property; the property keeps its previous state
    LeftUnset,
    /// The struct has no column-backed property of that name
    UnknownProperty,
}

impl From<bool> for Assignment {
    fn from(assigned: bool) -> Self {
        if assigned {
            Assignment::Assigned
        } else {
            Assignment::LeftUnset
        }
    }
}

/// Object-safe access to an entity's properties by name
pub trait EntityObject: Debug + Send + Sync {
    /// Fully qualified identifier of the concrete type
    fn entity_type(&self) -> &'static str;

    /// Assign a hydrated value to the named property
    fn assign(&mut self, property: &str, value: Value) -> Result<Assignment, ValueError>;

    /// Read the named property, `None` when it is unset or unknown
    fn read(&self, property: &str) -> Option<Value>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl dyn EntityObject {
    pub fn downcast_ref<T: Entity>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Entity>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    pub fn downcast<T: Entity>(self: Box<Self>) -> Option<Box<T>> {
        self.into_any().downcast::<T>().ok()
    }
}

/// A mapped type with declared metadata.
///
/// `Default` stands in for construction without running user logic: hydration
/// starts from `T::default()` and only touches properties present in the row.
pub trait Entity: EntityObject + Default + Sized + 'static {
    /// Fully qualified identifier (`module_path!()::Type`)
    fn type_path() -> &'static str;

    /// Bare type name
    fn type_name() -> &'static str;

    /// Column-backed properties in declaration order
    fn properties() -> &'static [PropertyInfo];

    /// Raw attribute declarations
    fn annotations() -> EntityAnnotations;

    /// Read and validate metadata from the declarations. Not cached; use an
    /// `EntityRegistry` for repeated lookups.
    fn metadata() -> EntityResult<EntityMetadata> {
        EntityMetadata::from_annotations(
            Self::type_path(),
            Self::type_name(),
            Self::properties(),
            Self::annotations(),
        )
    }

    /// Hydrate a new instance with the shared hydrator
    fn from_row(row: &Row) -> EntityResult<Self> {
        Hydrator::shared().hydrate(row)
    }

    /// Extract every set property with the shared hydrator
    fn to_row(&self) -> EntityResult<Row> {
        Hydrator::shared().extract(self, None)
    }
}
