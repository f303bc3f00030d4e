//! Daemon status endpoint.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use lumen_app::ports::{DeviceControl, EventPublisher, RoutineRepository};
use lumen_app::session::SessionProgress;

use crate::error::ApiError;
use crate::state::AppState;

/// Body of `GET /api/status`.
#[derive(Debug, Serialize)]
pub struct DaemonStatus {
    pub uptime_seconds: u64,
    pub routine_count: usize,
    pub active_routines: Vec<SessionProgress>,
}

/// `GET /api/status`: uptime, stored routines and running sessions.
pub async fn status<D, R, P>(
    State(state): State<AppState<D, R, P>>,
) -> Result<Json<DaemonStatus>, ApiError>
where
    D: DeviceControl + Send + Sync + 'static,
    R: RoutineRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let routine_count = state.routine_service.list_routines().await?.len();
    Ok(Json(DaemonStatus {
        uptime_seconds: state.started.elapsed().as_secs(),
        routine_count,
        active_routines: state.engine.active_statuses(),
    }))
}
