//! Batch hydration results

use crate::error::EntityError;

/// A row that failed to hydrate, with its position in the input
#[derive(Debug)]
pub struct RowFailure {
    pub index: usize,
    pub error: EntityError,
}

/// Entities hydrated from a batch of rows, plus the rows that failed
#[derive(Debug)]
pub struct BatchHydration<T> {
    pub entities: Vec<T>,
    pub failures: Vec<RowFailure>,
}

impl<T> BatchHydration<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entities: Vec::with_capacity(capacity),
            failures: Vec::new(),
        }
    }

    /// Returns true if every row hydrated
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// The entities, or the first failure if any row failed
    pub fn into_result(self) -> Result<Vec<T>, EntityError> {
        match self.failures.into_iter().next() {
            Some(failure) => Err(failure.error),
            None => Ok(self.entities),
        }
    }
}

impl<T> IntoIterator for BatchHydration<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.into_iter()
    }
}
