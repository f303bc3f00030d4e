//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod color;
#[allow(clippy::missing_errors_doc)]
pub mod config;
#[allow(clippy::missing_errors_doc)]
pub mod routines;
pub mod sse;
#[allow(clippy::missing_errors_doc)]
pub mod status;
#[allow(clippy::missing_errors_doc)]
pub mod trigger;

use axum::Router;
use axum::routing::{get, post};

use lumen_app::ports::{DeviceControl, EventPublisher, RoutineRepository};
use lumen_domain::id::RoutineId;

use crate::error::ApiError;
use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<D, R, P>() -> Router<AppState<D, R, P>>
where
    D: DeviceControl + Send + Sync + 'static,
    R: RoutineRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    Router::new()
        // Routines
        .route(
            "/routines",
            get(routines::list::<D, R, P>).post(routines::create::<D, R, P>),
        )
        .route(
            "/routines/{id}",
            get(routines::get::<D, R, P>)
                .put(routines::update::<D, R, P>)
                .delete(routines::delete::<D, R, P>),
        )
        .route("/routines/{id}/start", post(routines::start::<D, R, P>))
        .route("/routines/{id}/cancel", post(routines::cancel::<D, R, P>))
        .route("/routines/{id}/status", get(routines::status::<D, R, P>))
        // Generic trigger
        .route("/trigger/{id}", post(trigger::trigger::<D, R, P>))
        // Daemon
        .route("/status", get(status::status::<D, R, P>))
        .route("/color/preview", post(color::preview))
        .route("/config/export", get(config::export::<D, R, P>))
        .route("/config/import", post(config::import::<D, R, P>))
        .route("/events/stream", get(sse::stream::<D, R, P>))
}

/// Parse a routine id taken from the request path.
fn routine_id(raw: String) -> Result<RoutineId, ApiError> {
    Ok(RoutineId::new(raw).map_err(lumen_domain::error::LumenError::from)?)
}

/// Decode an optional JSON body: an empty body yields the default value.
fn optional_json<T>(body: &[u8]) -> Result<T, ApiError>
where
    T: serde::de::DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|err| ApiError::BadRequest(err.to_string()))
}
