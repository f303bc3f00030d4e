//! Generic trigger endpoint used by buttons, shortcuts and other automations.

use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;

use lumen_app::ports::{DeviceControl, EventPublisher, RoutineRepository};
use lumen_app::routine_engine::{StartOptions, StartedRoutine};

use super::routine_id;
use crate::error::ApiError;
use crate::state::AppState;

/// What a trigger set in motion.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Triggered {
    Routine(StartedRoutine),
}

/// `POST /api/trigger/{id}`: start the routine with this id.
pub async fn trigger<D, R, P>(
    State(state): State<AppState<D, R, P>>,
    Path(id): Path<String>,
) -> Result<Json<Triggered>, ApiError>
where
    D: DeviceControl + Send + Sync + 'static,
    R: RoutineRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let id = routine_id(id)?;
    let started = state.engine.start(&id, StartOptions::default()).await?;
    tracing::info!(routine_id = %id, "triggered routine");
    Ok(Json(Triggered::Routine(started)))
}
