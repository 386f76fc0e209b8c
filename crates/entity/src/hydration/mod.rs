//! Hydration and extraction
//!
//! `Hydrator` walks a row, resolves each column's semantic type from entity
//! metadata, runs the coercion engine and assigns through the
//! nullability-respecting `Property<T>` setter. Extraction runs the same
//! engine in reverse over every assigned property.

pub mod batch;

pub use batch::{BatchHydration, RowFailure};

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::coercion::TypeCoercer;
use crate::config::MappingConfig;
use crate::entity::{Assignment, Entity, EntityObject};
use crate::error::{EntityError, EntityResult};
use crate::metadata::{EntityMetadata, EntityRegistry};
use crate::value::Row;

static SHARED_HYDRATOR: Lazy<Hydrator> = Lazy::new(|| {
    let config = MappingConfig::from_env().unwrap_or_else(|e| {
        tracing::warn!("Ignoring invalid entity mapping environment: {}", e);
        MappingConfig::default()
    });
    Hydrator::new(config)
});

/// Converts rows to entities and entities to rows
#[derive(Debug, Clone)]
pub struct Hydrator {
    coercer: TypeCoercer,
    registry: Arc<EntityRegistry>,
}

impl Default for Hydrator {
    fn default() -> Self {
        Self::new(MappingConfig::default())
    }
}

impl Hydrator {
    /// Create a hydrator with its own registry
    pub fn new(config: MappingConfig) -> Self {
        Self {
            coercer: TypeCoercer::new(config),
            registry: Arc::new(EntityRegistry::new()),
        }
    }

    /// Process-wide hydrator configured from the environment
    pub fn shared() -> &'static Hydrator {
        &SHARED_HYDRATOR
    }

    /// Share a registry between hydrators
    pub fn with_registry(mut self, registry: Arc<EntityRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn config(&self) -> &MappingConfig {
        self.coercer.config()
    }

    /// Register an entity type so it can be hydrated by identifier
    pub fn register<T: Entity>(&self) -> EntityResult<Arc<EntityMetadata>> {
        self.registry.register::<T>()
    }

    /// Hydrate a new `T` from a row
    pub fn hydrate<T: Entity>(&self, row: &Row) -> EntityResult<T> {
        let metadata = self.registry.metadata_of::<T>()?;
        let mut entity = T::default();
        self.hydrate_into(&mut entity, &metadata, row)?;
        Ok(entity)
    }

    /// Hydrate a new `T` from a row whose column names differ from the
    /// property names (`column -> property`)
    pub fn hydrate_with_mapping<T: Entity>(
        &self,
        row: &Row,
        column_mapping: &HashMap<String, String>,
    ) -> EntityResult<T> {
        let renamed: Row = row
            .iter()
            .map(|(column, raw)| {
                let property = column_mapping
                    .get(column)
                    .cloned()
                    .unwrap_or_else(|| column.to_string());
                (property, raw.clone())
            })
            .collect();
        self.hydrate(&renamed)
    }

    /// Hydrate a registered entity known only by its identifier
    pub fn hydrate_named(&self, identifier: &str, row: &Row) -> EntityResult<Box<dyn EntityObject>> {
        let (mut entity, metadata) = self.registry.create(identifier)?;
        self.hydrate_into(entity.as_mut(), &metadata, row)?;
        Ok(entity)
    }

    /// Hydrate every row.
    ///
    /// Under `lenient_batches` a failing row is recorded and the rest still
    /// hydrate; otherwise the first failure is returned. Metadata errors fail
    /// the whole batch either way.
    pub fn hydrate_batch<T: Entity>(&self, rows: &[Row]) -> EntityResult<BatchHydration<T>> {
        let metadata = self.registry.metadata_of::<T>()?;
        let mut batch = BatchHydration::with_capacity(rows.len());

        for (index, row) in rows.iter().enumerate() {
            let mut entity = T::default();
            match self.hydrate_into(&mut entity, &metadata, row) {
                Ok(()) => batch.entities.push(entity),
                Err(error) if error.is_configuration() || !self.config().lenient_batches => {
                    return Err(error);
                }
                Err(error) => {
                    tracing::warn!("Skipping row {} of {} batch: {}", index, T::type_path(), error);
                    batch.failures.push(RowFailure { index, error });
                }
            }
        }

        tracing::debug!(
            "Hydrated {} of {} rows into {}",
            batch.entities.len(),
            rows.len(),
            T::type_path()
        );
        Ok(batch)
    }

    /// Hydrate every row, failing on the first row that cannot be hydrated
    pub fn hydrate_all<T: Entity>(&self, rows: &[Row]) -> EntityResult<Vec<T>> {
        let metadata = self.registry.metadata_of::<T>()?;
        rows.iter()
            .map(|row| {
                let mut entity = T::default();
                self.hydrate_into(&mut entity, &metadata, row)?;
                Ok(entity)
            })
            .collect()
    }

    /// Assign every matching column of `row` onto an existing entity
    pub fn hydrate_into(
        &self,
        entity: &mut dyn EntityObject,
        metadata: &EntityMetadata,
        row: &Row,
    ) -> EntityResult<()> {
        let type_path = metadata.type_path();
        if metadata.is_abstract() {
            return Err(EntityError::configuration(
                type_path,
                "Abstract entities cannot be hydrated",
            ));
        }

        for (column, raw) in row.iter() {
            if metadata.property(column).is_none() {
                tracing::trace!("Skipping column '{}' with no property on {}", column, type_path);
                continue;
            }

            let value = self
                .coercer
                .hydrate(metadata.semantic_type_of(column), raw)
                .map_err(|e| EntityError::coercion(type_path, column, e))?;

            match entity
                .assign(column, value)
                .map_err(|e| EntityError::coercion(type_path, column, e))?
            {
                Assignment::Assigned => {}
                Assignment::LeftUnset => {
                    tracing::trace!("Null for non-nullable '{}.{}' left unset", type_path, column);
                }
                Assignment::UnknownProperty => {
                    tracing::trace!("Column '{}' not assignable on {}", column, type_path);
                }
            }
        }

        Ok(())
    }

    /// Extract every assigned property, or only those named in `fields`
    pub fn extract<T: Entity>(&self, entity: &T, fields: Option<&[&str]>) -> EntityResult<Row> {
        let metadata = self.registry.metadata_of::<T>()?;
        self.extract_from(entity, &metadata, fields)
    }

    /// Extract from an entity known only as an `EntityObject`
    pub fn extract_from(
        &self,
        entity: &dyn EntityObject,
        metadata: &EntityMetadata,
        fields: Option<&[&str]>,
    ) -> EntityResult<Row> {
        let mut row = Row::new();

        for property in &metadata.properties {
            if let Some(selected) = fields {
                if !selected.contains(&property.name) {
                    continue;
                }
            }

            let Some(value) = entity.read(property.name) else {
                continue;
            };

            let raw = self
                .coercer
                .extract(metadata.semantic_type_of(property.name), value)
                .map_err(|e| EntityError::coercion(metadata.type_path(), property.name, e))?;
            row.insert(property.name, raw);
        }

        Ok(row)
    }
}
