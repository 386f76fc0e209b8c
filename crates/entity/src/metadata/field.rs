//! Field Metadata - Column descriptors for column-backed properties

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::attributes::FieldAttribute;
use super::types::SemanticType;
use crate::error::{EntityError, EntityResult};

/// Column description of one property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub property: String,
    pub semantic_type: SemanticType,
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub nullable: bool,
    pub default: Option<JsonValue>,
    pub unique: bool,
    pub unsigned: bool,
    pub auto_increment: bool,
    pub comment: Option<String>,
    /// Part of the primary key
    pub is_id: bool,
    /// Identifier generated as a UUID
    pub generated_uuid: bool,
}

impl FieldDescriptor {
    pub fn new(property: impl Into<String>, semantic_type: SemanticType) -> Self {
        Self {
            property: property.into(),
            semantic_type,
            length: None,
            precision: None,
            scale: None,
            nullable: false,
            default: None,
            unique: false,
            unsigned: false,
            auto_increment: false,
            comment: None,
            is_id: false,
            generated_uuid: false,
        }
    }

    /// Build a descriptor from a `#[field]` declaration
    pub fn from_attribute(entity: &str, property: &str, attr: &FieldAttribute) -> EntityResult<Self> {
        let semantic_type: SemanticType = attr.type_tag.parse().map_err(|e| {
            EntityError::configuration(entity, format!("Field '{}': {}", property, e))
        })?;

        Ok(Self {
            property: property.to_string(),
            semantic_type,
            length: attr.length,
            precision: attr.precision,
            scale: attr.scale,
            nullable: attr.nullable,
            default: attr.default.clone(),
            unique: attr.unique,
            unsigned: attr.unsigned,
            auto_increment: attr.auto_increment,
            comment: attr.comment.map(str::to_string),
            is_id: false,
            generated_uuid: false,
        })
    }

    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_precision(mut self, precision: u32, scale: u32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_default(mut self, default: JsonValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.is_id = true;
        self
    }

    pub fn generated_uuid(mut self) -> Self {
        self.generated_uuid = true;
        self
    }

    /// Declared length, or the type's default when none was declared
    pub fn effective_length(&self) -> Option<u32> {
        self.length.or_else(|| self.semantic_type.default_length())
    }

    /// Validate the field for consistency
    pub fn validate(&self, entity: &str) -> EntityResult<()> {
        let err = |message: &str| {
            EntityError::configuration(entity, format!("Field '{}': {}", self.property, message))
        };
        let ty = self.semantic_type;

        if (self.precision.is_some() || self.scale.is_some()) && !ty.is_fractional() {
            return Err(err("precision and scale only apply to decimal, float and double"));
        }

        if let (Some(precision), Some(scale)) = (self.precision, self.scale) {
            if scale > precision {
                return Err(err("scale cannot exceed precision"));
            }
        }

        if self.unsigned && !(ty.is_integer() || ty.is_fractional()) {
            return Err(err("unsigned only applies to numeric types"));
        }

        if self.auto_increment && !ty.is_integer() {
            return Err(err("auto_increment only applies to integer types"));
        }

        if self.generated_uuid && !matches!(ty, SemanticType::Uuid | SemanticType::String | SemanticType::Char) {
            return Err(err("a generated uuid must be stored as uuid or string"));
        }

        if self.length == Some(0) {
            return Err(err("length must be positive"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_descriptor_creation() {
        let field = FieldDescriptor::new("price", SemanticType::Decimal)
            .with_precision(10, 2)
            .with_default(json!(0.0))
            .unsigned();

        assert_eq!(field.precision, Some(10));
        assert_eq!(field.scale, Some(2));
        assert!(!field.nullable);
        assert!(field.validate("app::Product").is_ok());
    }

    #[test]
    fn test_effective_length() {
        assert_eq!(FieldDescriptor::new("name", SemanticType::String).effective_length(), Some(255));
        assert_eq!(
            FieldDescriptor::new("name", SemanticType::String).with_length(80).effective_length(),
            Some(80)
        );
        assert_eq!(FieldDescriptor::new("ip", SemanticType::IpAddress).effective_length(), Some(45));
        assert_eq!(FieldDescriptor::new("body", SemanticType::Text).effective_length(), None);
    }

    #[test]
    fn test_from_attribute_unknown_type() {
        let attr = FieldAttribute {
            type_tag: "varchar",
            ..Default::default()
        };
        let err = FieldDescriptor::from_attribute("app::User", "name", &attr).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("varchar"));
    }

    #[test]
    fn test_validation_rules() {
        let scale_too_large = FieldDescriptor::new("price", SemanticType::Decimal).with_precision(4, 6);
        assert!(scale_too_large.validate("app::Product").is_err());

        let precision_on_text = FieldDescriptor::new("name", SemanticType::String).with_precision(4, 2);
        assert!(precision_on_text.validate("app::Product").is_err());

        let auto_text = FieldDescriptor::new("name", SemanticType::String).auto_increment();
        assert!(auto_text.validate("app::Product").is_err());

        let uuid_int = FieldDescriptor::new("id", SemanticType::Integer).generated_uuid();
        assert!(uuid_int.validate("app::Product").is_err());

        let id = FieldDescriptor::new("id", SemanticType::BigInt)
            .primary_key()
            .auto_increment()
            .unsigned();
        assert!(id.validate("app::Product").is_ok());
    }
}
