//! Export and import of every stored routine as one JSON document.

use axum::Json;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};

use lumen_app::ports::{DeviceControl, EventPublisher, RoutineRepository};
use lumen_app::services::routine_service::{ImportSummary, RoutineBundle};

use crate::error::ApiError;
use crate::state::AppState;

const EXPORT_DISPOSITION: &str = "attachment; filename=lumen-routines.json";

/// Possible responses from the export endpoint.
pub enum ExportResponse {
    Attachment(Json<RoutineBundle>),
}

impl IntoResponse for ExportResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Attachment(json) => {
                ([(header::CONTENT_DISPOSITION, EXPORT_DISPOSITION)], json).into_response()
            }
        }
    }
}

/// `GET /api/config/export`: download every routine.
pub async fn export<D, R, P>(
    State(state): State<AppState<D, R, P>>,
) -> Result<ExportResponse, ApiError>
where
    D: DeviceControl + Send + Sync + 'static,
    R: RoutineRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let bundle = state.routine_service.export_routines().await?;
    Ok(ExportResponse::Attachment(Json(bundle)))
}

/// `POST /api/config/import`: create or replace the routines of an export.
pub async fn import<D, R, P>(
    State(state): State<AppState<D, R, P>>,
    Json(bundle): Json<RoutineBundle>,
) -> Result<Json<ImportSummary>, ApiError>
where
    D: DeviceControl + Send + Sync + 'static,
    R: RoutineRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let summary = state.routine_service.import_routines(bundle).await?;
    Ok(Json(summary))
}
