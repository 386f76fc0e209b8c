//! Attribute declarations
//!
//! Plain data emitted by `#[derive(Entity)]`, one record per annotated
//! property. Nothing here is validated; `EntityMetadata::from_annotations`
//! turns these records into descriptors and rejects contradictions.

use serde_json::Value as JsonValue;

use super::relationships::RelationshipKind;

/// Everything declared on an entity type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityAnnotations {
    /// The `#[entity(...)]` marker, absent for plain mapped structs
    pub entity: Option<EntityAttribute>,
    pub properties: Vec<PropertyAnnotations>,
}

/// `#[entity(table = "...", abstract_entity)]`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityAttribute {
    pub table: Option<&'static str>,
    pub abstract_entity: bool,
}

/// Attributes declared on a single property
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyAnnotations {
    pub property: &'static str,
    pub field: Option<FieldAttribute>,
    /// `#[id]`
    pub id: bool,
    /// `#[uuid]`, identifier generated as a UUID
    pub uuid: bool,
    pub relationship: Option<RelationshipAttribute>,
}

impl PropertyAnnotations {
    pub fn new(property: &'static str) -> Self {
        Self {
            property,
            ..Default::default()
        }
    }

    /// Returns true if at least one recognized attribute is present
    pub fn is_annotated(&self) -> bool {
        self.field.is_some() || self.id || self.uuid || self.relationship.is_some()
    }
}

/// `#[field(type = "...", ...)]`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldAttribute {
    pub type_tag: &'static str,
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub nullable: bool,
    pub default: Option<JsonValue>,
    pub unique: bool,
    pub unsigned: bool,
    pub auto_increment: bool,
    pub comment: Option<&'static str>,
}

/// One of `#[one_to_one]`, `#[one_to_many]`, `#[many_to_one]`, `#[many_to_many]`
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipAttribute {
    pub kind: RelationshipKind,
    pub target: &'static str,
    pub mapped_by: Option<&'static str>,
    pub inversed_by: Option<&'static str>,
    pub nullable: Option<bool>,
    pub join_table: Option<JoinTableAttribute>,
}

impl RelationshipAttribute {
    pub fn new(kind: RelationshipKind, target: &'static str) -> Self {
        Self {
            kind,
            target,
            mapped_by: None,
            inversed_by: None,
            nullable: None,
            join_table: None,
        }
    }
}

/// `join_table(name = "...", join_column = "...", inverse_column = "...")`
#[derive(Debug, Clone, PartialEq)]
pub struct JoinTableAttribute {
    pub name: &'static str,
    pub join_column: &'static str,
    pub inverse_column: &'static str,
}
