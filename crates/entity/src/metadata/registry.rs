//! Entity Registry - Metadata cache and factories keyed by type identifier
//!
//! Metadata is read once per type and shared as `Arc<EntityMetadata>`.
//! Registration also stores a factory so entities can be created and hydrated
//! when only their identifier is known (for example, one found by discovery).

use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;

use super::descriptor::EntityMetadata;
use crate::entity::{Entity, EntityObject};
use crate::error::{EntityError, EntityResult};

/// Factory function that creates an unpopulated entity instance
pub type EntityFactory = fn() -> Box<dyn EntityObject>;

#[derive(Clone)]
struct Registration {
    metadata: Arc<EntityMetadata>,
    factory: EntityFactory,
}

/// Concurrent registry of entity types
#[derive(Default)]
pub struct EntityRegistry {
    entries: DashMap<String, Registration>,
}

static GLOBAL_REGISTRY: Lazy<EntityRegistry> = Lazy::new(EntityRegistry::new);

impl EntityRegistry {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Process-wide registry instance
    pub fn global() -> &'static EntityRegistry {
        &GLOBAL_REGISTRY
    }

    /// Register an entity type, reading its metadata on first use.
    ///
    /// Registering the same type again returns the cached metadata. Entries
    /// are keyed by `T::type_path()`; `#[derive(Entity)]` rejects generic
    /// structs since their instantiations would share one key.
    pub fn register<T: Entity>(&self) -> EntityResult<Arc<EntityMetadata>> {
        if let Some(existing) = self.entries.get(T::type_path()) {
            return Ok(existing.metadata.clone());
        }

        // Read outside the map lock; a concurrent registration of the same
        // type keeps whichever entry lands first
        let metadata = Arc::new(T::metadata()?);
        let registration = Registration {
            metadata,
            factory: create_instance::<T>,
        };

        let entry = self
            .entries
            .entry(T::type_path().to_string())
            .or_insert(registration);
        tracing::debug!("Registered entity type: {}", T::type_path());
        Ok(entry.metadata.clone())
    }

    /// Cached metadata for a type, registering it when needed
    pub fn metadata_of<T: Entity>(&self) -> EntityResult<Arc<EntityMetadata>> {
        self.register::<T>()
    }

    /// Cached metadata for a registered identifier
    pub fn get(&self, identifier: &str) -> Option<Arc<EntityMetadata>> {
        self.entries
            .get(identifier)
            .map(|entry| entry.metadata.clone())
    }

    /// Create an unpopulated instance of a registered, non-abstract entity
    pub fn create(&self, identifier: &str) -> EntityResult<(Box<dyn EntityObject>, Arc<EntityMetadata>)> {
        let registration = self
            .entries
            .get(identifier)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| EntityError::UnknownEntity(identifier.to_string()))?;

        if registration.metadata.is_abstract() {
            return Err(EntityError::configuration(
                identifier,
                "Abstract entities cannot be instantiated",
            ));
        }

        tracing::trace!("Created entity instance: {}", identifier);
        Ok(((registration.factory)(), registration.metadata))
    }

    /// Check if an entity type is registered
    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    /// All registered identifiers, sorted
    pub fn identifiers(&self) -> Vec<String> {
        let mut identifiers: Vec<String> = self.entries.iter().map(|entry| entry.key().clone()).collect();
        identifiers.sort();
        identifiers
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all registrations
    pub fn clear(&self) {
        self.entries.clear();
        tracing::debug!("Cleared entity registry");
    }
}

impl std::fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityRegistry")
            .field("entities", &self.identifiers())
            .finish()
    }
}

fn create_instance<T: Entity>() -> Box<dyn EntityObject> {
    Box::new(T::default())
}
