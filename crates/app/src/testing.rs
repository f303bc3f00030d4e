//! Fakes for the ports, shared by the unit tests of this crate.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Mutex;

use lumen_domain::error::{ConflictError, LumenError, NotFoundError};
use lumen_domain::event::{Event, EventType};
use lumen_domain::id::{LightId, RoutineId};
use lumen_domain::light::{LightCommand, LightState};
use lumen_domain::routine::RoutineDefinition;

use crate::ports::{DeviceControl, EventPublisher, RoutineRepository};

/// Let spawned tasks run. With a paused clock the runtime only advances time
/// once every other task is idle.
pub async fn settle() {
    tokio::time::sleep(std::time::Duration::from_millis(1)).await;
}

/// Records every command and answers reads from what it was last told,
/// unless a reported state was set explicitly.
#[derive(Default)]
pub struct RecordingDevice {
    commands: Mutex<Vec<LightCommand>>,
    reported: Mutex<HashMap<LightId, LightState>>,
    failing: Mutex<HashSet<LightId>>,
}

impl RecordingDevice {
    pub fn commands(&self) -> Vec<LightCommand> {
        self.commands.lock().unwrap().clone()
    }

    pub fn commands_for(&self, light: &str) -> Vec<LightCommand> {
        self.commands()
            .into_iter()
            .filter(|c| c.light_id.as_str() == light)
            .collect()
    }

    pub fn clear(&self) {
        self.commands.lock().unwrap().clear();
    }

    /// Make the light report `state` regardless of later commands.
    pub fn report(&self, light: &str, state: LightState) {
        self.reported
            .lock()
            .unwrap()
            .insert(LightId::new(light).unwrap(), state);
        self.failing.lock().unwrap().remove(&LightId::new(light).unwrap());
    }

    /// Make every call for this light fail.
    pub fn fail_light(&self, light: &str) {
        self.failing
            .lock()
            .unwrap()
            .insert(LightId::new(light).unwrap());
    }

    fn device_error(light: &LightId) -> LumenError {
        LumenError::Device(format!("light {light} unreachable").into())
    }
}

impl DeviceControl for RecordingDevice {
    fn set_light_state(
        &self,
        command: &LightCommand,
    ) -> impl Future<Output = Result<(), LumenError>> + Send {
        let result = if self.failing.lock().unwrap().contains(&command.light_id) {
            Err(Self::device_error(&command.light_id))
        } else {
            self.commands.lock().unwrap().push(command.clone());
            Ok(())
        };
        async { result }
    }

    fn get_light_state(
        &self,
        light_id: &LightId,
    ) -> impl Future<Output = Result<LightState, LumenError>> + Send {
        let result = if self.failing.lock().unwrap().contains(light_id) {
            Err(Self::device_error(light_id))
        } else if let Some(state) = self.reported.lock().unwrap().get(light_id) {
            Ok(*state)
        } else {
            self.commands
                .lock()
                .unwrap()
                .iter()
                .rev()
                .find(|c| &c.light_id == light_id)
                .map(|c| LightState {
                    on: c.on,
                    brightness: c.brightness,
                })
                .ok_or_else(|| Self::device_error(light_id))
        };
        async { result }
    }
}

#[derive(Default)]
pub struct InMemoryRoutineRepo {
    store: Mutex<HashMap<RoutineId, RoutineDefinition>>,
}

impl InMemoryRoutineRepo {
    pub fn with(routines: impl IntoIterator<Item = RoutineDefinition>) -> Self {
        let repo = Self::default();
        {
            let mut store = repo.store.lock().unwrap();
            for routine in routines {
                store.insert(routine.id.clone(), routine);
            }
        }
        repo
    }
}

impl RoutineRepository for InMemoryRoutineRepo {
    fn create(
        &self,
        routine: RoutineDefinition,
    ) -> impl Future<Output = Result<RoutineDefinition, LumenError>> + Send {
        let mut store = self.store.lock().unwrap();
        let result = if store.contains_key(&routine.id) {
            Err(ConflictError {
                entity: "Routine",
                id: routine.id.to_string(),
            }
            .into())
        } else {
            store.insert(routine.id.clone(), routine.clone());
            Ok(routine)
        };
        async { result }
    }

    fn get_by_id(
        &self,
        id: &RoutineId,
    ) -> impl Future<Output = Result<Option<RoutineDefinition>, LumenError>> + Send {
        let result = self.store.lock().unwrap().get(id).cloned();
        async { Ok(result) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<RoutineDefinition>, LumenError>> + Send {
        let mut result: Vec<RoutineDefinition> =
            self.store.lock().unwrap().values().cloned().collect();
        result.sort_by(|a, b| a.id.cmp(&b.id));
        async { Ok(result) }
    }

    fn update(
        &self,
        routine: RoutineDefinition,
    ) -> impl Future<Output = Result<RoutineDefinition, LumenError>> + Send {
        let mut store = self.store.lock().unwrap();
        let result = if store.contains_key(&routine.id) {
            store.insert(routine.id.clone(), routine.clone());
            Ok(routine)
        } else {
            Err(NotFoundError {
                entity: "Routine",
                id: routine.id.to_string(),
            }
            .into())
        };
        async { result }
    }

    fn delete(&self, id: &RoutineId) -> impl Future<Output = Result<(), LumenError>> + Send {
        let removed = self.store.lock().unwrap().remove(id);
        let result = match removed {
            Some(_) => Ok(()),
            None => Err(NotFoundError {
                entity: "Routine",
                id: id.to_string(),
            }
            .into()),
        };
        async { result }
    }
}

#[derive(Default)]
pub struct SpyPublisher {
    events: Mutex<Vec<Event>>,
}

impl SpyPublisher {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn types(&self) -> Vec<EventType> {
        self.events().iter().map(|e| e.event_type).collect()
    }
}

impl EventPublisher for SpyPublisher {
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), LumenError>> + Send {
        self.events.lock().unwrap().push(event);
        async { Ok(()) }
    }
}
