//! `SQLite` implementation of [`RoutineRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use lumen_app::ports::RoutineRepository;
use lumen_domain::error::{ConflictError, LumenError, NotFoundError};
use lumen_domain::id::RoutineId;
use lumen_domain::routine::{RoutineDefinition, Track};
use lumen_domain::time::now;

use crate::error::StorageError;

struct Wrapper(RoutineDefinition);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<RoutineDefinition> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let name: String = row.try_get("name")?;
        let duration_minutes: f64 = row.try_get("duration_minutes")?;
        let override_detection: bool = row.try_get("override_detection")?;
        let tracks_json: String = row.try_get("tracks")?;

        let id = RoutineId::new(id).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let tracks: Vec<Track> = serde_json::from_str(&tracks_json)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

        Ok(Self(RoutineDefinition {
            id,
            name,
            duration_minutes,
            override_detection,
            tracks,
        }))
    }
}

fn not_found(id: &RoutineId) -> LumenError {
    NotFoundError {
        entity: "Routine",
        id: id.to_string(),
    }
    .into()
}

/// `SQLite`-backed routine repository. Tracks are stored as a JSON column.
pub struct SqliteRoutineRepository {
    pool: SqlitePool,
}

impl SqliteRoutineRepository {
    /// Create a new repository backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl RoutineRepository for SqliteRoutineRepository {
    async fn create(&self, routine: RoutineDefinition) -> Result<RoutineDefinition, LumenError> {
        let tracks_json = serde_json::to_string(&routine.tracks).map_err(StorageError::from)?;
        let created_at = now().to_rfc3339();

        let result = sqlx::query(
                "INSERT INTO routines (id, name, duration_minutes, override_detection, tracks, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(routine.id.as_str())
            .bind(&routine.name)
            .bind(routine.duration_minutes)
            .bind(routine.override_detection)
            .bind(&tracks_json)
            .bind(&created_at)
            .bind(&created_at)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(routine),
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => Err(ConflictError {
                entity: "Routine",
                id: routine.id.to_string(),
            }
            .into()),
            Err(err) => Err(StorageError::from(err).into()),
        }
    }

    async fn get_by_id(&self, id: &RoutineId) -> Result<Option<RoutineDefinition>, LumenError> {
        let row: Option<Wrapper> = sqlx::query_as("SELECT * FROM routines WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Wrapper::maybe(row))
    }

    async fn get_all(&self) -> Result<Vec<RoutineDefinition>, LumenError> {
        let rows: Vec<Wrapper> = sqlx::query_as("SELECT * FROM routines ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn update(&self, routine: RoutineDefinition) -> Result<RoutineDefinition, LumenError> {
        let tracks_json = serde_json::to_string(&routine.tracks).map_err(StorageError::from)?;

        let result = sqlx::query(
                "UPDATE routines SET name = ?, duration_minutes = ?, override_detection = ?, tracks = ?, updated_at = ? WHERE id = ?",
            )
            .bind(&routine.name)
            .bind(routine.duration_minutes)
            .bind(routine.override_detection)
            .bind(&tracks_json)
            .bind(now().to_rfc3339())
            .bind(routine.id.as_str())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        if result.rows_affected() == 0 {
            return Err(not_found(&routine.id));
        }
        Ok(routine)
    }

    async fn delete(&self, id: &RoutineId) -> Result<(), LumenError> {
        let result = sqlx::query("DELETE FROM routines WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }
}
