//! Entity Metadata - The validated, read-only description of an entity type

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::attributes::EntityAnnotations;
use super::field::FieldDescriptor;
use super::naming::default_table_name;
use super::relationships::RelationshipDescriptor;
use super::types::SemanticType;
use crate::error::{EntityError, EntityResult};

/// Type-level description of an entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    /// Fully qualified type identifier (`crate::module::Type`)
    pub type_path: String,
    /// Bare type name
    pub name: String,
    /// Explicit table name from `#[entity(table = "...")]`
    pub table: Option<String>,
    /// Carries the `#[entity]` marker
    pub is_entity: bool,
    pub is_abstract: bool,
}

impl EntityDescriptor {
    pub fn new(type_path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            type_path: type_path.into(),
            name: name.into(),
            table: None,
            is_entity: false,
            is_abstract: false,
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Explicit table name, or the snake_case plural of the type name
    pub fn table_name(&self) -> String {
        self.table
            .clone()
            .unwrap_or_else(|| default_table_name(&self.name))
    }
}

/// A declared, column-backed property of an entity struct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PropertyInfo {
    pub name: &'static str,
    /// The Rust type inside `Property<..>`, with any outer `Option` removed
    pub declared_type: &'static str,
    /// Declared as `Property<Option<..>>`
    pub nullable: bool,
}

/// Everything known about one entity type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityMetadata {
    pub descriptor: EntityDescriptor,
    /// Field descriptors in declaration order
    pub fields: Vec<FieldDescriptor>,
    pub relationships: Vec<RelationshipDescriptor>,
    /// Column-backed properties in declaration order
    pub properties: Vec<PropertyInfo>,
}

impl EntityMetadata {
    /// Validate the declarations of an entity type and build its metadata
    pub fn from_annotations(
        type_path: &str,
        type_name: &str,
        properties: &[PropertyInfo],
        annotations: EntityAnnotations,
    ) -> EntityResult<Self> {
        let mut descriptor = EntityDescriptor::new(type_path, type_name);
        if let Some(marker) = &annotations.entity {
            descriptor.is_entity = true;
            descriptor.is_abstract = marker.abstract_entity;
            if let Some(table) = marker.table {
                if table.trim().is_empty() {
                    return Err(EntityError::configuration(type_path, "Table name cannot be empty"));
                }
                descriptor.table = Some(table.to_string());
            }
        }

        let mut seen = HashSet::new();
        let mut fields = Vec::new();
        let mut relationships = Vec::new();

        for annotation in annotations.properties.iter().filter(|a| a.is_annotated()) {
            let property = annotation.property;
            if !seen.insert(property) {
                return Err(EntityError::configuration(
                    type_path,
                    format!("Property '{}' is declared more than once", property),
                ));
            }

            if let Some(relationship) = &annotation.relationship {
                if annotation.field.is_some() || annotation.id || annotation.uuid {
                    return Err(EntityError::configuration(
                        type_path,
                        format!("Relationship '{}' cannot also be a column", property),
                    ));
                }
                relationships.push(RelationshipDescriptor::from_attribute(
                    type_path,
                    property,
                    relationship,
                )?);
                continue;
            }

            let info = properties.iter().find(|p| p.name == property);
            let mut field = match &annotation.field {
                Some(attr) => FieldDescriptor::from_attribute(type_path, property, attr)?,
                None => {
                    let semantic_type = info
                        .and_then(|p| SemanticType::infer(p.declared_type))
                        .or_else(|| annotation.uuid.then_some(SemanticType::Uuid))
                        .ok_or_else(|| {
                            EntityError::configuration(
                                type_path,
                                format!(
                                    "Cannot infer the column type of '{}'; declare #[field(type = \"...\")]",
                                    property
                                ),
                            )
                        })?;
                    let mut field = FieldDescriptor::new(property, semantic_type);
                    field.nullable = info.map_or(false, |p| p.nullable);
                    field
                }
            };
            field.is_id = annotation.id;
            field.generated_uuid = annotation.uuid;
            field.validate(type_path)?;
            fields.push(field);
        }

        tracing::debug!(
            "Read metadata for '{}': {} fields, {} relationships",
            type_path,
            fields.len(),
            relationships.len()
        );

        Ok(Self {
            descriptor,
            fields,
            relationships,
            properties: properties.to_vec(),
        })
    }

    pub fn type_path(&self) -> &str {
        &self.descriptor.type_path
    }

    pub fn is_abstract(&self) -> bool {
        self.descriptor.is_abstract
    }

    pub fn table_name(&self) -> String {
        self.descriptor.table_name()
    }

    pub fn field(&self, property: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.property == property)
    }

    pub fn relationship(&self, property: &str) -> Option<&RelationshipDescriptor> {
        self.relationships.iter().find(|r| r.property == property)
    }

    pub fn property(&self, name: &str) -> Option<&PropertyInfo> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Identifier fields, in declaration order
    pub fn primary_key(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.is_id)
    }

    /// The semantic type that drives coercion for a property: the declared
    /// field type, or one inferred from the Rust type when no field is declared
    pub fn semantic_type_of(&self, property: &str) -> Option<SemanticType> {
        self.field(property).map(|f| f.semantic_type).or_else(|| {
            self.property(property)
                .and_then(|p| SemanticType::infer(p.declared_type))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::attributes::{
        EntityAttribute, FieldAttribute, JoinTableAttribute, PropertyAnnotations,
        RelationshipAttribute,
    };
    use crate::metadata::relationships::RelationshipKind;

    const POST_PROPERTIES: &[PropertyInfo] = &[
        PropertyInfo {
            name: "id",
            declared_type: "i64",
            nullable: false,
        },
        PropertyInfo {
            name: "title",
            declared_type: "String",
            nullable: false,
        },
        PropertyInfo {
            name: "published_at",
            declared_type: "DateTime<Utc>",
            nullable: true,
        },
    ];

    fn post_annotations() -> EntityAnnotations {
        let mut id = PropertyAnnotations::new("id");
        id.id = true;
        id.field = Some(FieldAttribute {
            type_tag: "bigInt",
            auto_increment: true,
            ..Default::default()
        });

        let mut title = PropertyAnnotations::new("title");
        title.field = Some(FieldAttribute {
            type_tag: "string",
            length: Some(120),
            ..Default::default()
        });

        let mut tags = PropertyAnnotations::new("tags");
        let mut relationship = RelationshipAttribute::new(RelationshipKind::ManyToMany, "app::Tag");
        relationship.inversed_by = Some("posts");
        relationship.join_table = Some(JoinTableAttribute {
            name: "post_tag",
            join_column: "post_id",
            inverse_column: "tag_id",
        });
        tags.relationship = Some(relationship);

        EntityAnnotations {
            entity: Some(EntityAttribute::default()),
            properties: vec![id, title, PropertyAnnotations::new("published_at"), tags],
        }
    }

    #[test]
    fn test_metadata_from_annotations() {
        let metadata =
            EntityMetadata::from_annotations("app::BlogPost", "BlogPost", POST_PROPERTIES, post_annotations())
                .unwrap();

        assert!(metadata.descriptor.is_entity);
        assert!(!metadata.is_abstract());
        assert_eq!(metadata.table_name(), "blog_posts");
        assert_eq!(metadata.fields.len(), 2);
        assert_eq!(metadata.relationships.len(), 1);
        assert_eq!(metadata.primary_key().count(), 1);
        assert_eq!(metadata.field("title").unwrap().effective_length(), Some(120));
    }

    #[test]
    fn test_unannotated_property_is_absent_but_typed() {
        let metadata =
            EntityMetadata::from_annotations("app::BlogPost", "BlogPost", POST_PROPERTIES, post_annotations())
                .unwrap();

        assert!(metadata.field("published_at").is_none());
        assert_eq!(metadata.semantic_type_of("published_at"), Some(SemanticType::DateTime));
        assert_eq!(metadata.semantic_type_of("missing"), None);
    }

    #[test]
    fn test_id_without_field_infers_type() {
        let mut id = PropertyAnnotations::new("id");
        id.id = true;
        let annotations = EntityAnnotations {
            entity: None,
            properties: vec![id],
        };

        let metadata = EntityMetadata::from_annotations("app::Post", "Post", POST_PROPERTIES, annotations).unwrap();
        let field = metadata.field("id").unwrap();
        assert!(field.is_id);
        assert_eq!(field.semantic_type, SemanticType::BigInt);
        assert!(!metadata.descriptor.is_entity);
    }

    #[test]
    fn test_relationship_with_field_is_rejected() {
        let mut annotations = post_annotations();
        annotations.properties[3].field = Some(FieldAttribute {
            type_tag: "json",
            ..Default::default()
        });

        let err = EntityMetadata::from_annotations("app::Post", "Post", POST_PROPERTIES, annotations).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_explicit_table_name() {
        let mut annotations = post_annotations();
        annotations.entity = Some(EntityAttribute {
            table: Some("articles"),
            abstract_entity: false,
        });

        let metadata = EntityMetadata::from_annotations("app::Post", "Post", POST_PROPERTIES, annotations).unwrap();
        assert_eq!(metadata.table_name(), "articles");
    }
}
