//! # lumen-adapter-virtual
//!
//! Virtual light bridge that keeps every light's state in memory. It stands
//! in for a real bridge in demos and end-to-end tests.
//!
//! | Operation | Behaviour |
//! |-----------|-----------|
//! | `set_light_state` | Applies power, brightness and color to the light |
//! | `get_light_state` | Returns the stored power and brightness |
//!
//! Unknown light ids either fail with `NotFound` or are registered on first
//! use, depending on [`VirtualLightsConfig::auto_register`].
//!
//! ## Dependency rule
//!
//! Depends on `lumen-app` (port traits) and `lumen-domain` only.

mod config;
mod error;
mod light;

pub use config::VirtualLightsConfig;
pub use error::VirtualError;
pub use light::VirtualLight;

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use lumen_app::ports::DeviceControl;
use lumen_domain::error::LumenError;
use lumen_domain::id::LightId;
use lumen_domain::light::{LightCommand, LightState};

/// In-memory light bridge.
pub struct VirtualLights {
    lights: Mutex<HashMap<LightId, VirtualLight>>,
    auto_register: bool,
}

impl Default for VirtualLights {
    fn default() -> Self {
        Self {
            lights: Mutex::new(HashMap::new()),
            auto_register: true,
        }
    }
}

impl VirtualLights {
    /// Build a bridge from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`VirtualError::InvalidLightId`] if a configured id is blank.
    pub fn from_config(config: &VirtualLightsConfig) -> Result<Self, VirtualError> {
        let mut lights = HashMap::new();
        for id in &config.lights {
            let id = LightId::new(id.as_str()).map_err(VirtualError::InvalidLightId)?;
            lights.insert(id, VirtualLight::default());
        }
        tracing::debug!(count = lights.len(), auto_register = config.auto_register, "virtual lights ready");
        Ok(Self {
            lights: Mutex::new(lights),
            auto_register: config.auto_register,
        })
    }

    /// Current state of a light, if it is known.
    #[must_use]
    pub fn light(&self, light_id: &LightId) -> Option<VirtualLight> {
        self.lock().get(light_id).cloned()
    }

    /// Known light ids, sorted.
    #[must_use]
    pub fn light_ids(&self) -> Vec<LightId> {
        let mut ids: Vec<LightId> = self.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Change a light as if someone used a wall switch or an app.
    pub fn set_manual(&self, light_id: &LightId, on: bool, brightness: u8) {
        let mut lights = self.lock();
        let light = lights.entry(light_id.clone()).or_default();
        light.on = on;
        light.brightness = brightness;
    }

    /// Make every call for this light fail (or succeed again).
    pub fn set_reachable(&self, light_id: &LightId, reachable: bool) {
        self.lock().entry(light_id.clone()).or_default().reachable = reachable;
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<LightId, VirtualLight>> {
        self.lights.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_light<T>(
        &self,
        light_id: &LightId,
        f: impl FnOnce(&mut VirtualLight) -> T,
    ) -> Result<T, VirtualError> {
        let mut lights = self.lock();
        if !lights.contains_key(light_id) {
            if !self.auto_register {
                return Err(VirtualError::UnknownLight(light_id.clone()));
            }
            tracing::debug!(%light_id, "registering virtual light");
            lights.insert(light_id.clone(), VirtualLight::default());
        }
        match lights.get_mut(light_id) {
            Some(light) if light.reachable => Ok(f(light)),
            Some(_) => Err(VirtualError::Unreachable(light_id.clone())),
            None => Err(VirtualError::UnknownLight(light_id.clone())),
        }
    }
}

impl DeviceControl for VirtualLights {
    fn set_light_state(
        &self,
        command: &LightCommand,
    ) -> impl Future<Output = Result<(), LumenError>> + Send {
        let result = self
            .with_light(&command.light_id, |light| light.apply(command))
            .map_err(LumenError::from);
        if result.is_ok() {
            tracing::trace!(light_id = %command.light_id, on = command.on, brightness = ?command.brightness, "virtual light updated");
        }
        async { result }
    }

    fn get_light_state(
        &self,
        light_id: &LightId,
    ) -> impl Future<Output = Result<LightState, LumenError>> + Send {
        let result = self
            .with_light(light_id, |light| light.state())
            .map_err(LumenError::from);
        async { result }
    }
}
