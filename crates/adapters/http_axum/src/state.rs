//! Shared application state for axum handlers.

use std::sync::Arc;
use std::time::Instant;

use lumen_app::event_bus::InProcessEventBus;
use lumen_app::routine_engine::RoutineEngine;
use lumen_app::services::routine_service::RoutineService;

/// Application state shared across all axum handlers.
///
/// Generic over the device, repository and publisher types to avoid dynamic
/// dispatch. `Clone` is implemented manually so the underlying types do not
/// need to be `Clone`.
pub struct AppState<D, R, P> {
    /// Routine CRUD service.
    pub routine_service: Arc<RoutineService<R, P>>,
    /// Running sessions.
    pub engine: RoutineEngine<D, R, P>,
    /// Source of the server-sent event stream.
    pub event_bus: Arc<InProcessEventBus>,
    /// When the daemon came up, for uptime reporting.
    pub started: Instant,
}

impl<D, R, P> Clone for AppState<D, R, P> {
    fn clone(&self) -> Self {
        Self {
            routine_service: Arc::clone(&self.routine_service),
            engine: self.engine.clone(),
            event_bus: Arc::clone(&self.event_bus),
            started: self.started,
        }
    }
}

impl<D, R, P> AppState<D, R, P> {
    /// Create a new application state.
    pub fn new(
        routine_service: RoutineService<R, P>,
        engine: RoutineEngine<D, R, P>,
        event_bus: Arc<InProcessEventBus>,
    ) -> Self {
        Self {
            routine_service: Arc::new(routine_service),
            engine,
            event_bus,
            started: Instant::now(),
        }
    }
}
