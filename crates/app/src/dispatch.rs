//! Best-effort command dispatch.
//!
//! Every light command the engine issues goes through [`BestEffort::send`]:
//! the call runs on its own task, and a failure is logged and never reaches
//! the caller. Commands for different lights are independent of each other.

use std::sync::Arc;

use lumen_domain::light::LightCommand;

use crate::ports::DeviceControl;

/// Fire-and-forget sender for [`LightCommand`]s.
pub struct BestEffort<D> {
    device: Arc<D>,
}

impl<D> Clone for BestEffort<D> {
    fn clone(&self) -> Self {
        Self {
            device: Arc::clone(&self.device),
        }
    }
}

impl<D> BestEffort<D>
where
    D: DeviceControl + Send + Sync + 'static,
{
    pub fn new(device: Arc<D>) -> Self {
        Self { device }
    }

    /// The device the commands are sent to.
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Send `command` in the background. `purpose` only shows up in logs.
    pub fn send(&self, command: LightCommand, purpose: &'static str) {
        let device = Arc::clone(&self.device);
        tokio::spawn(async move {
            if let Err(err) = device.set_light_state(&command).await {
                tracing::warn!(
                    light_id = %command.light_id,
                    purpose,
                    error = ?err,
                    "light command failed"
                );
            }
        });
    }

    /// Send every command in `commands`.
    pub fn send_all(&self, commands: impl IntoIterator<Item = LightCommand>, purpose: &'static str) {
        for command in commands {
            self.send(command, purpose);
        }
    }
}
