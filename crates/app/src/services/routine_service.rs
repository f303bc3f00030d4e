//! Routine service: use-cases for managing routine definitions.

use serde::{Deserialize, Serialize};

use lumen_domain::error::{ConflictError, LumenError, NotFoundError};
use lumen_domain::event::{Event, EventType};
use lumen_domain::id::RoutineId;
use lumen_domain::routine::{RoutineDefinition, Track};

use crate::ports::{EventPublisher, RoutineRepository};

/// Input for [`RoutineService::create_routine`].
///
/// A missing id is derived from the name; a missing duration defaults to
/// 10 minutes and override detection defaults to enabled.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewRoutine {
    #[serde(default)]
    pub id: Option<RoutineId>,
    pub name: String,
    #[serde(default)]
    pub duration_minutes: Option<f64>,
    #[serde(default)]
    pub override_detection: Option<bool>,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

/// Partial update for [`RoutineService::update_routine`]. Absent fields are kept.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoutinePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<f64>,
    #[serde(default)]
    pub override_detection: Option<bool>,
    #[serde(default)]
    pub tracks: Option<Vec<Track>>,
}

impl RoutinePatch {
    fn apply(self, routine: &mut RoutineDefinition) {
        if let Some(name) = self.name {
            routine.name = name;
        }
        if let Some(duration) = self.duration_minutes {
            routine.duration_minutes = duration;
        }
        if let Some(enabled) = self.override_detection {
            routine.override_detection = enabled;
        }
        if let Some(tracks) = self.tracks {
            routine.tracks = tracks;
        }
    }
}

/// Every stored routine, as exported and re-imported between daemons.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutineBundle {
    #[serde(default)]
    pub routines: Vec<RoutineDefinition>,
}

/// Outcome of [`RoutineService::import_routines`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub created: usize,
    pub updated: usize,
}

/// Application service for routine CRUD operations.
pub struct RoutineService<R, P> {
    repo: R,
    publisher: P,
}

impl<R: RoutineRepository, P: EventPublisher> RoutineService<R, P> {
    /// Create a new service backed by the given repository and publisher.
    pub fn new(repo: R, publisher: P) -> Self {
        Self { repo, publisher }
    }

    /// Create a new routine after validating domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`LumenError::Validation`] if invariants fail,
    /// [`LumenError::Conflict`] if the id is taken, or a storage error
    /// propagated from the repository.
    #[tracing::instrument(skip_all, fields(routine_name = %input.name))]
    pub async fn create_routine(&self, input: NewRoutine) -> Result<RoutineDefinition, LumenError> {
        let mut builder = RoutineDefinition::builder()
            .name(input.name)
            .tracks(input.tracks);
        if let Some(id) = input.id {
            builder = builder.id(id);
        }
        if let Some(duration) = input.duration_minutes {
            builder = builder.duration_minutes(duration);
        }
        if let Some(enabled) = input.override_detection {
            builder = builder.override_detection(enabled);
        }
        let routine = builder.build()?;

        if self.repo.get_by_id(&routine.id).await?.is_some() {
            return Err(ConflictError {
                entity: "Routine",
                id: routine.id.to_string(),
            }
            .into());
        }
        let created = self.repo.create(routine).await?;
        tracing::info!(routine_id = %created.id, "routine created");
        self.announce(EventType::RoutineCreated, &created).await;
        Ok(created)
    }

    /// Look up a routine by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`LumenError::NotFound`] when no routine with `id` exists,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get_routine(&self, id: &RoutineId) -> Result<RoutineDefinition, LumenError> {
        self.repo.get_by_id(id).await?.ok_or_else(|| not_found(id))
    }

    /// List all routines.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_routines(&self) -> Result<Vec<RoutineDefinition>, LumenError> {
        self.repo.get_all().await
    }

    /// Apply a partial update and re-validate.
    ///
    /// Running sessions keep the definition they started with.
    ///
    /// # Errors
    ///
    /// Returns [`LumenError::NotFound`] for an unknown id,
    /// [`LumenError::Validation`] if the result is invalid, or a storage
    /// error from the repository.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update_routine(
        &self,
        id: &RoutineId,
        patch: RoutinePatch,
    ) -> Result<RoutineDefinition, LumenError> {
        let mut routine = self.get_routine(id).await?;
        patch.apply(&mut routine);
        routine.validate()?;
        let updated = self.repo.update(routine).await?;
        tracing::info!(routine_id = %updated.id, "routine updated");
        self.announce(EventType::RoutineUpdated, &updated).await;
        Ok(updated)
    }

    /// Delete a routine by id.
    ///
    /// # Errors
    ///
    /// Returns [`LumenError::NotFound`] for an unknown id, or a storage
    /// error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn delete_routine(&self, id: &RoutineId) -> Result<(), LumenError> {
        let routine = self.get_routine(id).await?;
        self.repo.delete(id).await?;
        tracing::info!(routine_id = %id, "routine deleted");
        self.announce(EventType::RoutineDeleted, &routine).await;
        Ok(())
    }

    /// Snapshot every stored routine.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn export_routines(&self) -> Result<RoutineBundle, LumenError> {
        let routines = self.repo.get_all().await?;
        tracing::info!(count = routines.len(), "routines exported");
        Ok(RoutineBundle { routines })
    }

    /// Store every routine of `bundle`, replacing routines with the same id.
    /// Routines missing from the bundle are left untouched; a later entry
    /// wins over an earlier one with the same id.
    ///
    /// The whole bundle is validated first, so an invalid routine stores
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns [`LumenError::Validation`] for the first invalid routine, or a
    /// storage error from the repository.
    #[tracing::instrument(skip_all, fields(count = bundle.routines.len()))]
    pub async fn import_routines(&self, bundle: RoutineBundle) -> Result<ImportSummary, LumenError> {
        for routine in &bundle.routines {
            routine.validate()?;
        }

        let mut summary = ImportSummary::default();
        for routine in bundle.routines {
            if self.repo.get_by_id(&routine.id).await?.is_some() {
                let updated = self.repo.update(routine).await?;
                self.announce(EventType::RoutineUpdated, &updated).await;
                summary.updated += 1;
            } else {
                let created = self.repo.create(routine).await?;
                self.announce(EventType::RoutineCreated, &created).await;
                summary.created += 1;
            }
        }
        tracing::info!(created = summary.created, updated = summary.updated, "routines imported");
        Ok(summary)
    }

    async fn announce(&self, event_type: EventType, routine: &RoutineDefinition) {
        let event = Event::new(
            event_type,
            Some(routine.id.clone()),
            serde_json::json!({ "name": routine.name }),
        );
        if let Err(err) = self.publisher.publish(event).await {
            tracing::warn!(%event_type, error = ?err, "failed to publish event");
        }
    }
}

fn not_found(id: &RoutineId) -> LumenError {
    NotFoundError {
        entity: "Routine",
        id: id.to_string(),
    }
    .into()
}
