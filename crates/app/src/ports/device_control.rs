//! Device control port: the bridge that actually drives the lights.
//!
//! Implementations talk to a light bridge (or simulate one). They must never
//! panic: every failure is reported as a [`LumenError`] so the engine can log
//! it and carry on with the next light.

use std::future::Future;

use lumen_domain::error::LumenError;
use lumen_domain::id::LightId;
use lumen_domain::light::{LightCommand, LightState};

/// Sends commands to lights and reads their current state.
pub trait DeviceControl {
    /// Apply a state change to one light.
    fn set_light_state(
        &self,
        command: &LightCommand,
    ) -> impl Future<Output = Result<(), LumenError>> + Send;

    /// Read what a light currently reports.
    fn get_light_state(
        &self,
        light_id: &LightId,
    ) -> impl Future<Output = Result<LightState, LumenError>> + Send;
}

impl<T: DeviceControl + Send + Sync> DeviceControl for std::sync::Arc<T> {
    fn set_light_state(
        &self,
        command: &LightCommand,
    ) -> impl Future<Output = Result<(), LumenError>> + Send {
        (**self).set_light_state(command)
    }

    fn get_light_state(
        &self,
        light_id: &LightId,
    ) -> impl Future<Output = Result<LightState, LumenError>> + Send {
        (**self).get_light_state(light_id)
    }
}
