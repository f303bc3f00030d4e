//! JSON REST handlers for routines and their playback.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use lumen_app::ports::{DeviceControl, EventPublisher, RoutineRepository};
use lumen_app::routine_engine::{StartOptions, StartedRoutine};
use lumen_app::services::routine_service::{NewRoutine, RoutinePatch};
use lumen_app::session::RoutineStatus;
use lumen_domain::id::RoutineId;
use lumen_domain::routine::RoutineDefinition;

use super::{optional_json, routine_id};
use crate::error::ApiError;
use crate::state::AppState;

/// One row of the routine listing.
#[derive(Debug, Serialize)]
pub struct RoutineSummary {
    pub id: RoutineId,
    pub name: String,
    pub duration_minutes: f64,
    pub track_count: usize,
    /// Sum of the light counts of every track; a light used by two tracks counts twice.
    pub light_count: usize,
    pub active: bool,
}

impl RoutineSummary {
    fn new(routine: RoutineDefinition, active: bool) -> Self {
        Self {
            light_count: routine.tracks.iter().map(|track| track.lights().len()).sum(),
            track_count: routine.tracks.len(),
            id: routine.id,
            name: routine.name,
            duration_minutes: routine.duration_minutes,
            active,
        }
    }
}

/// Body of `POST /api/routines/{id}/cancel`.
#[derive(Debug, Serialize)]
pub struct CancelResult {
    pub cancelled: bool,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<RoutineSummary>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get and update endpoints.
pub enum GetResponse {
    Ok(Json<RoutineDefinition>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<RoutineDefinition>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the delete endpoint.
pub enum DeleteResponse {
    NoContent,
}

impl IntoResponse for DeleteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `GET /api/routines`: list all routines with their playback flag.
pub async fn list<D, R, P>(
    State(state): State<AppState<D, R, P>>,
) -> Result<ListResponse, ApiError>
where
    D: DeviceControl + Send + Sync + 'static,
    R: RoutineRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let routines = state.routine_service.list_routines().await?;
    let summaries = routines
        .into_iter()
        .map(|routine| {
            let active = state.engine.is_active(&routine.id);
            RoutineSummary::new(routine, active)
        })
        .collect();
    Ok(ListResponse::Ok(Json(summaries)))
}

/// `GET /api/routines/{id}`: get a routine definition.
pub async fn get<D, R, P>(
    State(state): State<AppState<D, R, P>>,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError>
where
    D: DeviceControl + Send + Sync + 'static,
    R: RoutineRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let id = routine_id(id)?;
    let routine = state.routine_service.get_routine(&id).await?;
    Ok(GetResponse::Ok(Json(routine)))
}

/// `POST /api/routines`: create a routine.
pub async fn create<D, R, P>(
    State(state): State<AppState<D, R, P>>,
    Json(req): Json<NewRoutine>,
) -> Result<CreateResponse, ApiError>
where
    D: DeviceControl + Send + Sync + 'static,
    R: RoutineRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let routine = state.routine_service.create_routine(req).await?;
    Ok(CreateResponse::Created(Json(routine)))
}

/// `PUT /api/routines/{id}`: partially update a routine.
pub async fn update<D, R, P>(
    State(state): State<AppState<D, R, P>>,
    Path(id): Path<String>,
    Json(patch): Json<RoutinePatch>,
) -> Result<GetResponse, ApiError>
where
    D: DeviceControl + Send + Sync + 'static,
    R: RoutineRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let id = routine_id(id)?;
    let routine = state.routine_service.update_routine(&id, patch).await?;
    Ok(GetResponse::Ok(Json(routine)))
}

/// `DELETE /api/routines/{id}`: delete a routine, stopping it if it runs.
pub async fn delete<D, R, P>(
    State(state): State<AppState<D, R, P>>,
    Path(id): Path<String>,
) -> Result<DeleteResponse, ApiError>
where
    D: DeviceControl + Send + Sync + 'static,
    R: RoutineRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let id = routine_id(id)?;
    state.routine_service.delete_routine(&id).await?;
    state.engine.cancel(&id).await;
    Ok(DeleteResponse::NoContent)
}

/// `POST /api/routines/{id}/start`: start (or restart) a routine.
///
/// The body is optional: `{"test_duration_minutes": 2}` compresses the run.
pub async fn start<D, R, P>(
    State(state): State<AppState<D, R, P>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<StartedRoutine>, ApiError>
where
    D: DeviceControl + Send + Sync + 'static,
    R: RoutineRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let id = routine_id(id)?;
    let options: StartOptions = optional_json(&body)?;
    let started = state.engine.start(&id, options).await?;
    Ok(Json(started))
}

/// `POST /api/routines/{id}/cancel`: stop a running routine.
pub async fn cancel<D, R, P>(
    State(state): State<AppState<D, R, P>>,
    Path(id): Path<String>,
) -> Result<Json<CancelResult>, ApiError>
where
    D: DeviceControl + Send + Sync + 'static,
    R: RoutineRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let id = routine_id(id)?;
    let cancelled = state.engine.cancel(&id).await;
    Ok(Json(CancelResult { cancelled }))
}

/// `GET /api/routines/{id}/status`: progress of a running routine.
pub async fn status<D, R, P>(
    State(state): State<AppState<D, R, P>>,
    Path(id): Path<String>,
) -> Result<Json<RoutineStatus>, ApiError>
where
    D: DeviceControl + Send + Sync + 'static,
    R: RoutineRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let id = routine_id(id)?;
    Ok(Json(state.engine.status(&id)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::test_support::{TestApp, sunrise_body};

    #[tokio::test]
    async fn should_create_routine_and_return_201() {
        let app = TestApp::new();

        let (status, body) = app.post("/api/routines", Some(sunrise_body())).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], "sunrise");
        assert_eq!(body["override_detection"], true);
        assert_eq!(body["tracks"][0]["type"], "fade");
    }

    #[tokio::test]
    async fn should_return_409_when_routine_exists() {
        let app = TestApp::new();
        app.post("/api/routines", Some(sunrise_body())).await;

        let (status, body) = app.post("/api/routines", Some(sunrise_body())).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("sunrise"));
    }

    #[tokio::test]
    async fn should_return_400_when_routine_is_invalid() {
        let app = TestApp::new();

        let (status, body) = app
            .post(
                "/api/routines",
                Some(json!({"name": "Bad", "duration_minutes": 0})),
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn should_return_400_when_instant_only_sets_a_transition() {
        let app = TestApp::new();
        let mut body = sunrise_body();
        body["tracks"].as_array_mut().unwrap().push(json!({
            "type": "instant",
            "lights": ["2"],
            "time": 5,
            "state": {"transition_deciseconds": 20}
        }));

        let (status, body) = app.post("/api/routines", Some(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("track #1"));
        assert_eq!(app.get("/api/routines").await.1, json!([]));
    }

    #[tokio::test]
    async fn should_list_summaries_with_light_count() {
        let app = TestApp::new();
        app.post(
            "/api/routines",
            Some(json!({
                "name": "Sunrise",
                "tracks": [
                    {"type": "fade", "lights": ["1", "2"], "waypoints": [{"time": 0, "brightness": 1}, {"time": 10, "brightness": 254}]},
                    {"type": "instant", "lights": ["2"], "time": 5, "state": {"on": false}}
                ]
            })),
        )
        .await;

        let (status, body) = app.get("/api/routines").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([{
                "id": "sunrise",
                "name": "Sunrise",
                "duration_minutes": 10.0,
                "track_count": 2,
                "light_count": 3,
                "active": false
            }])
        );
    }

    #[tokio::test]
    async fn should_return_404_for_unknown_routine() {
        let app = TestApp::new();
        let (status, _) = app.get("/api/routines/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn should_apply_partial_update() {
        let app = TestApp::new();
        app.post("/api/routines", Some(sunrise_body())).await;

        let (status, body) = app
            .put("/api/routines/sunrise", json!({"duration_minutes": 30}))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["duration_minutes"], 30.0);
        assert_eq!(body["name"], "Sunrise");
    }

    #[tokio::test]
    async fn should_start_routine_and_report_status() {
        let app = TestApp::new();
        app.post("/api/routines", Some(sunrise_body())).await;

        let (status, started) = app.post("/api/routines/sunrise/start", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(started["id"], "sunrise");
        assert_eq!(started["duration_minutes"], 10.0);

        let (_, status_body) = app.get("/api/routines/sunrise/status").await;
        assert_eq!(status_body["active"], true);
        assert_eq!(status_body["tick_count"], 0);

        let (_, list) = app.get("/api/routines").await;
        assert_eq!(list[0]["active"], true);
    }

    #[tokio::test]
    async fn should_start_with_test_duration() {
        let app = TestApp::new();
        app.post("/api/routines", Some(sunrise_body())).await;

        let (status, started) = app
            .post(
                "/api/routines/sunrise/start",
                Some(json!({"test_duration_minutes": 2})),
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(started["duration_minutes"], 2.0);
    }

    #[tokio::test]
    async fn should_return_404_when_starting_unknown_routine() {
        let app = TestApp::new();
        let (status, _) = app.post("/api/routines/nope/start", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn should_return_400_for_malformed_start_body() {
        let app = TestApp::new();
        app.post("/api/routines", Some(sunrise_body())).await;

        let (status, _) = app
            .post(
                "/api/routines/sunrise/start",
                Some(json!({"test_duration_minutes": "soon"})),
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_cancel_running_routine() {
        let app = TestApp::new();
        app.post("/api/routines", Some(sunrise_body())).await;
        app.post("/api/routines/sunrise/start", None).await;

        let (_, first) = app.post("/api/routines/sunrise/cancel", None).await;
        let (_, second) = app.post("/api/routines/sunrise/cancel", None).await;

        assert_eq!(first, json!({"cancelled": true}));
        assert_eq!(second, json!({"cancelled": false}));
        let (_, status_body) = app.get("/api/routines/sunrise/status").await;
        assert_eq!(status_body, json!({"active": false}));
    }

    #[tokio::test]
    async fn should_stop_session_when_routine_is_deleted() {
        let app = TestApp::new();
        app.post("/api/routines", Some(sunrise_body())).await;
        app.post("/api/routines/sunrise/start", None).await;

        let status = app.delete("/api/routines/sunrise").await;

        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(!app.state.engine.is_active(&"sunrise".parse().unwrap()));
        assert_eq!(app.delete("/api/routines/sunrise").await, StatusCode::NOT_FOUND);
    }
}
