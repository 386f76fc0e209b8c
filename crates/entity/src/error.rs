//! Error types for the entity mapping layer
//!
//! Metadata problems surface as `Configuration`, value conversion problems as
//! `Coercion` (with the owning entity and property attached), and directory
//! scanning problems as `Discovery`.

use thiserror::Error;

/// Result type alias for entity operations
pub type EntityResult<T> = Result<T, EntityError>;

/// Error types for entity mapping operations
#[derive(Debug, Error)]
pub enum EntityError {
    /// An attribute on the entity is self-contradictory or unknown
    #[error("Configuration error in '{entity}': {message}")]
    Configuration { entity: String, message: String },

    /// A raw value could not be converted to the property's semantic type
    #[error("Cannot coerce value {value} for '{entity}.{property}': {reason}")]
    Coercion {
        entity: String,
        property: String,
        value: String,
        reason: String,
    },

    /// Directory scanning failed
    #[error("Discovery error at '{path}': {message}")]
    Discovery { path: String, message: String },

    /// A property was read before any value was assigned to it
    #[error("Property '{0}' has not been initialized")]
    Uninitialized(String),

    /// No entity is registered under the given identifier
    #[error("Unknown entity '{0}'")]
    UnknownEntity(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EntityError {
    pub fn configuration(entity: impl Into<String>, message: impl Into<String>) -> Self {
        EntityError::Configuration {
            entity: entity.into(),
            message: message.into(),
        }
    }

    pub fn discovery(path: impl Into<String>, message: impl Into<String>) -> Self {
        EntityError::Discovery {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Attach entity and property context to a value conversion failure
    pub fn coercion(entity: &str, property: &str, err: ValueError) -> Self {
        EntityError::Coercion {
            entity: entity.to_string(),
            property: property.to_string(),
            value: err.value,
            reason: err.reason,
        }
    }

    /// Check if this is a configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self, EntityError::Configuration { .. })
    }

    /// Check if this is a coercion error
    pub fn is_coercion(&self) -> bool {
        matches!(self, EntityError::Coercion { .. })
    }

    /// Check if this is an uninitialized property read
    pub fn is_uninitialized(&self) -> bool {
        matches!(self, EntityError::Uninitialized(_))
    }
}

/// A value that could not be converted, before entity context is known
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot convert {value}: {reason}")]
pub struct ValueError {
    pub value: String,
    pub reason: String,
}

impl ValueError {
    pub fn new(value: impl ToString, reason: impl Into<String>) -> Self {
        Self {
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}
