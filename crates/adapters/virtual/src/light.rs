//! A single simulated light.

use lumen_domain::color::DeviceColor;
use lumen_domain::light::{LightCommand, LightState};

/// In-memory state of one virtual light.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualLight {
    pub on: bool,
    pub brightness: u8,
    pub color: Option<DeviceColor>,
    pub reachable: bool,
}

impl Default for VirtualLight {
    fn default() -> Self {
        Self {
            on: false,
            brightness: 0,
            color: None,
            reachable: true,
        }
    }
}

impl VirtualLight {
    /// Apply the fields the command carries; absent fields keep their value.
    pub fn apply(&mut self, command: &LightCommand) {
        self.on = command.on;
        if let Some(brightness) = command.brightness {
            self.brightness = brightness;
        }
        if let Some(color) = command.color {
            self.color = Some(color);
        }
    }

    #[must_use]
    pub fn state(&self) -> LightState {
        LightState {
            on: self.on,
            brightness: Some(self.brightness),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_domain::id::LightId;

    #[test]
    fn should_default_to_off() {
        let light = VirtualLight::default();
        assert!(!light.state().on);
    }

    #[test]
    fn should_keep_brightness_when_command_omits_it() {
        let mut light = VirtualLight::default();
        light.apply(&LightCommand::on(LightId::new("1").unwrap(), 120, Some(DeviceColor::Mirek(300))));
        light.apply(&LightCommand {
            light_id: LightId::new("1").unwrap(),
            on: false,
            brightness: None,
            transition_deciseconds: Some(10),
            color: None,
        });

        assert_eq!(
            light.state(),
            LightState {
                on: false,
                brightness: Some(120)
            }
        );
        assert_eq!(light.color, Some(DeviceColor::Mirek(300)));
    }
}
