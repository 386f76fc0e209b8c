//! Relationship Metadata - Descriptors for associations between entities

use serde::{Deserialize, Serialize};

use super::attributes::{JoinTableAttribute, RelationshipAttribute};
use crate::error::{EntityError, EntityResult};

/// Defines the kind of association between two entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipKind {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl RelationshipKind {
    /// Returns true if this relationship holds a collection
    pub fn is_collection(self) -> bool {
        matches!(self, Self::OneToMany | Self::ManyToMany)
    }

    /// Returns true if the kind accepts a `nullable` flag
    pub fn supports_nullable(self) -> bool {
        matches!(self, Self::OneToOne | Self::OneToMany)
    }

    pub fn attribute_name(self) -> &'static str {
        match self {
            Self::OneToOne => "one_to_one",
            Self::OneToMany => "one_to_many",
            Self::ManyToOne => "many_to_one",
            Self::ManyToMany => "many_to_many",
        }
    }
}

/// Join table configuration for many-to-many relationships
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinTable {
    pub name: String,
    /// Column referencing the owning entity
    pub join_column: String,
    /// Column referencing the target entity
    pub inverse_column: String,
}

impl JoinTable {
    pub fn new(
        name: impl Into<String>,
        join_column: impl Into<String>,
        inverse_column: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            join_column: join_column.into(),
            inverse_column: inverse_column.into(),
        }
    }

    /// Validate the join table configuration
    pub fn validate(&self, entity: &str) -> EntityResult<()> {
        if self.name.is_empty() {
            return Err(EntityError::configuration(entity, "Join table name cannot be empty"));
        }

        if self.join_column.is_empty() || self.inverse_column.is_empty() {
            return Err(EntityError::configuration(
                entity,
                format!("Join table '{}' must name both columns", self.name),
            ));
        }

        if self.join_column == self.inverse_column {
            return Err(EntityError::configuration(
                entity,
                format!(
                    "Join table '{}' join column and inverse column must be different",
                    self.name
                ),
            ));
        }

        Ok(())
    }
}

impl From<&JoinTableAttribute> for JoinTable {
    fn from(attr: &JoinTableAttribute) -> Self {
        JoinTable::new(attr.name, attr.join_column, attr.inverse_column)
    }
}

/// A validated relationship declared on one property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipDescriptor {
    pub property: String,
    pub kind: RelationshipKind,
    /// Identifier of the target entity type
    pub target: String,
    /// Set on the inverse side: the owning side's property name
    pub mapped_by: Option<String>,
    /// Set on the owning side: the inverse side's property name
    pub inversed_by: Option<String>,
    /// Only carried by one-to-one and one-to-many
    pub nullable: Option<bool>,
    pub join_table: Option<JoinTable>,
}

impl RelationshipDescriptor {
    /// Create a new descriptor; nullable defaults to true where supported
    pub fn new(property: impl Into<String>, kind: RelationshipKind, target: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            kind,
            target: target.into(),
            mapped_by: None,
            inversed_by: None,
            nullable: kind.supports_nullable().then_some(true),
            join_table: None,
        }
    }

    pub fn with_mapped_by(mut self, mapped_by: impl Into<String>) -> Self {
        self.mapped_by = Some(mapped_by.into());
        self
    }

    pub fn with_inversed_by(mut self, inversed_by: impl Into<String>) -> Self {
        self.inversed_by = Some(inversed_by.into());
        self
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }

    pub fn with_join_table(mut self, join_table: JoinTable) -> Self {
        self.join_table = Some(join_table);
        self
    }

    /// Build and validate a descriptor from its declaration
    pub fn from_attribute(
        entity: &str,
        property: &str,
        attr: &RelationshipAttribute,
    ) -> EntityResult<Self> {
        if attr.nullable.is_some() && !attr.kind.supports_nullable() {
            return Err(EntityError::configuration(
                entity,
                format!(
                    "Relationship '{}': {} does not accept `nullable`",
                    property,
                    attr.kind.attribute_name()
                ),
            ));
        }

        let mut descriptor = RelationshipDescriptor::new(property, attr.kind, attr.target);
        descriptor.mapped_by = attr.mapped_by.map(str::to_string);
        descriptor.inversed_by = attr.inversed_by.map(str::to_string);
        if let Some(nullable) = attr.nullable {
            descriptor.nullable = Some(nullable);
        }
        descriptor.join_table = attr.join_table.as_ref().map(JoinTable::from);

        descriptor.validate(entity)?;
        Ok(descriptor)
    }

    /// Returns true if this side owns the association
    pub fn is_owning_side(&self) -> bool {
        self.mapped_by.is_none()
    }

    /// Validate the relationship for consistency
    pub fn validate(&self, entity: &str) -> EntityResult<()> {
        let err = |message: String| {
            EntityError::configuration(entity, format!("Relationship '{}': {}", self.property, message))
        };

        if self.target.trim().is_empty() {
            return Err(err("target entity cannot be empty".to_string()));
        }

        match (&self.mapped_by, &self.inversed_by) {
            (Some(_), Some(_)) => {
                return Err(err("`mapped_by` and `inversed_by` are mutually exclusive".to_string()));
            }
            (None, None) => {
                return Err(err(format!(
                    "{} requires either `mapped_by` or `inversed_by`",
                    self.kind.attribute_name()
                )));
            }
            _ => {}
        }

        match self.kind {
            RelationshipKind::OneToMany if self.inversed_by.is_some() => {
                return Err(err("one_to_many is always the inverse side; use `mapped_by`".to_string()));
            }
            RelationshipKind::ManyToOne if self.mapped_by.is_some() => {
                return Err(err("many_to_one is always the owning side; use `inversed_by`".to_string()));
            }
            _ => {}
        }

        match (self.kind, &self.join_table) {
            (RelationshipKind::ManyToMany, Some(join_table)) => {
                if !self.is_owning_side() {
                    return Err(err("only the owning side of many_to_many declares a join table".to_string()));
                }
                join_table.validate(entity)?;
            }
            (RelationshipKind::ManyToMany, None) if self.is_owning_side() => {
                return Err(err("the owning side of many_to_many requires a join table".to_string()));
            }
            (_, Some(_)) if self.kind != RelationshipKind::ManyToMany => {
                return Err(err(format!(
                    "{} does not accept a join table",
                    self.kind.attribute_name()
                )));
            }
            _ => {}
        }

        Ok(())
    }
}
