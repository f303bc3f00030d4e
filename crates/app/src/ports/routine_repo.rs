//! Routine repository port: persistence for routine definitions.

use std::future::Future;

use lumen_domain::error::LumenError;
use lumen_domain::id::RoutineId;
use lumen_domain::routine::RoutineDefinition;

/// Repository for persisting and querying [`RoutineDefinition`]s.
pub trait RoutineRepository {
    /// Create a new routine in storage.
    fn create(
        &self,
        routine: RoutineDefinition,
    ) -> impl Future<Output = Result<RoutineDefinition, LumenError>> + Send;

    /// Get a routine by its id.
    fn get_by_id(
        &self,
        id: &RoutineId,
    ) -> impl Future<Output = Result<Option<RoutineDefinition>, LumenError>> + Send;

    /// Get all routines, ordered by id.
    fn get_all(&self) -> impl Future<Output = Result<Vec<RoutineDefinition>, LumenError>> + Send;

    /// Replace an existing routine.
    fn update(
        &self,
        routine: RoutineDefinition,
    ) -> impl Future<Output = Result<RoutineDefinition, LumenError>> + Send;

    /// Delete a routine by its id.
    fn delete(&self, id: &RoutineId) -> impl Future<Output = Result<(), LumenError>> + Send;
}

impl<T: RoutineRepository + Send + Sync> RoutineRepository for std::sync::Arc<T> {
    fn create(
        &self,
        routine: RoutineDefinition,
    ) -> impl Future<Output = Result<RoutineDefinition, LumenError>> + Send {
        (**self).create(routine)
    }

    fn get_by_id(
        &self,
        id: &RoutineId,
    ) -> impl Future<Output = Result<Option<RoutineDefinition>, LumenError>> + Send {
        (**self).get_by_id(id)
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<RoutineDefinition>, LumenError>> + Send {
        (**self).get_all()
    }

    fn update(
        &self,
        routine: RoutineDefinition,
    ) -> impl Future<Output = Result<RoutineDefinition, LumenError>> + Send {
        (**self).update(routine)
    }

    fn delete(&self, id: &RoutineId) -> impl Future<Output = Result<(), LumenError>> + Send {
        (**self).delete(id)
    }
}
