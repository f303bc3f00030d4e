//! Fakes and request helpers shared by the handler tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use lumen_app::event_bus::InProcessEventBus;
use lumen_app::ports::{DeviceControl, RoutineRepository};
use lumen_app::routine_engine::{EngineConfig, RoutineEngine};
use lumen_app::services::routine_service::RoutineService;
use lumen_domain::error::{ConflictError, LumenError, NotFoundError};
use lumen_domain::id::{LightId, RoutineId};
use lumen_domain::light::{LightCommand, LightState};
use lumen_domain::routine::RoutineDefinition;

use crate::state::AppState;

/// Device that accepts everything and always reports lights as off.
pub struct NoopDevice;

impl DeviceControl for NoopDevice {
    async fn set_light_state(&self, _command: &LightCommand) -> Result<(), LumenError> {
        Ok(())
    }

    async fn get_light_state(&self, _light_id: &LightId) -> Result<LightState, LumenError> {
        Ok(LightState {
            on: false,
            brightness: None,
        })
    }
}

#[derive(Default)]
pub struct MemoryRepo {
    routines: Mutex<BTreeMap<RoutineId, RoutineDefinition>>,
}

impl MemoryRepo {
    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<RoutineId, RoutineDefinition>> {
        self.routines.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn not_found(id: &RoutineId) -> LumenError {
    NotFoundError {
        entity: "Routine",
        id: id.to_string(),
    }
    .into()
}

impl RoutineRepository for MemoryRepo {
    async fn create(&self, routine: RoutineDefinition) -> Result<RoutineDefinition, LumenError> {
        let mut routines = self.lock();
        if routines.contains_key(&routine.id) {
            return Err(ConflictError {
                entity: "Routine",
                id: routine.id.to_string(),
            }
            .into());
        }
        routines.insert(routine.id.clone(), routine.clone());
        Ok(routine)
    }

    async fn get_by_id(&self, id: &RoutineId) -> Result<Option<RoutineDefinition>, LumenError> {
        Ok(self.lock().get(id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<RoutineDefinition>, LumenError> {
        Ok(self.lock().values().cloned().collect())
    }

    async fn update(&self, routine: RoutineDefinition) -> Result<RoutineDefinition, LumenError> {
        let mut routines = self.lock();
        match routines.get_mut(&routine.id) {
            Some(slot) => {
                *slot = routine.clone();
                Ok(routine)
            }
            None => Err(not_found(&routine.id)),
        }
    }

    async fn delete(&self, id: &RoutineId) -> Result<(), LumenError> {
        self.lock().remove(id).map(|_| ()).ok_or_else(|| not_found(id))
    }
}

pub type TestState = AppState<NoopDevice, Arc<MemoryRepo>, Arc<InProcessEventBus>>;

pub struct TestApp {
    pub state: TestState,
}

impl TestApp {
    pub fn new() -> Self {
        let repo = Arc::new(MemoryRepo::default());
        let event_bus = Arc::new(InProcessEventBus::new(64));
        let service = RoutineService::new(Arc::clone(&repo), Arc::clone(&event_bus));
        let engine = RoutineEngine::new(
            Arc::new(NoopDevice),
            repo,
            Arc::clone(&event_bus),
            EngineConfig::default(),
        );
        Self {
            state: AppState::new(service, engine, event_bus),
        }
    }

    pub fn router(&self) -> Router {
        crate::router::build(self.state.clone())
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send(Method::POST, uri, body).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> StatusCode {
        self.send(Method::DELETE, uri, None).await.0
    }
}

/// A ten minute sunrise on light `1`.
pub fn sunrise_body() -> Value {
    json!({
        "name": "Sunrise",
        "tracks": [{
            "type": "fade",
            "lights": ["1"],
            "waypoints": [
                {"time": 0, "brightness": 1, "color": {"mirek": 500}},
                {"time": 10, "brightness": 254, "color": {"mirek": 150}}
            ]
        }]
    })
}
