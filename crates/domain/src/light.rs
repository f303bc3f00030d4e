//! Light commands and read-back state.
//!
//! [`LightCommand`] is the only thing that crosses into the device-control
//! port. [`LightStateSpec`] is the partial state an instant track carries
//! in a routine definition.

use serde::{Deserialize, Serialize};

use crate::color::{self, ColorSpec, DeviceColor};
use crate::error::ValidationError;
use crate::id::LightId;

/// Transition used when a routine starts and snaps its lights to the first waypoint.
pub const START_TRANSITION_DECISECONDS: u16 = 20;

/// Transition used when a routine completes and snaps its lights to the last waypoint.
pub const FINAL_TRANSITION_DECISECONDS: u16 = 10;

/// Highest brightness a light accepts.
pub const MAX_BRIGHTNESS: u8 = 254;

/// A state change for a single light.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightCommand {
    pub light_id: LightId,
    pub on: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition_deciseconds: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<DeviceColor>,
}

impl LightCommand {
    /// Turn a light on at `brightness` with an optional color.
    #[must_use]
    pub fn on(light_id: LightId, brightness: u8, color: Option<DeviceColor>) -> Self {
        Self {
            light_id,
            on: true,
            brightness: Some(brightness),
            transition_deciseconds: None,
            color,
        }
    }

    #[must_use]
    pub fn with_transition(mut self, deciseconds: u16) -> Self {
        self.transition_deciseconds = Some(deciseconds);
        self
    }
}

/// What a light reports about itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightState {
    pub on: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
}

/// Partial light state applied by an instant track.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LightStateSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition_deciseconds: Option<u16>,
}

impl LightStateSpec {
    /// Whether no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.on.is_none()
            && self.brightness.is_none()
            && self.color.is_none()
            && self.transition_deciseconds.is_none()
    }

    /// Whether applying this state changes a light: power, brightness or
    /// color is set. A transition alone does nothing.
    #[must_use]
    pub fn has_effect(&self) -> bool {
        self.on.is_some() || self.brightness.is_some() || self.color.is_some()
    }

    /// Check the fields that are present.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::BrightnessOutOfRange`] or
    /// [`ValidationError::InvalidColor`] for out-of-range values.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(brightness) = self.brightness
            && brightness > MAX_BRIGHTNESS
        {
            return Err(ValidationError::BrightnessOutOfRange(brightness));
        }
        if let Some(color) = &self.color {
            color::validate(color)?;
        }
        Ok(())
    }

    /// Build the command for one light.
    ///
    /// Power defaults to on when brightness or color is given. Returns `None`
    /// when the spec carries nothing a light could act on (for instance only
    /// a transition time).
    #[must_use]
    pub fn to_command(&self, light_id: LightId) -> Option<LightCommand> {
        let color = color::resolve_device_color(self.color.as_ref());
        let lights_up = self.brightness.is_some() || color.is_some();
        let on = match self.on {
            Some(on) => on,
            None if lights_up => true,
            None => return None,
        };
        Some(LightCommand {
            light_id,
            on,
            brightness: self.brightness,
            transition_deciseconds: self.transition_deciseconds,
            color,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light(id: &str) -> LightId {
        LightId::new(id).unwrap()
    }

    #[test]
    fn should_default_power_on_when_brightness_is_set() {
        let spec = LightStateSpec {
            brightness: Some(80),
            ..LightStateSpec::default()
        };
        let command = spec.to_command(light("1")).unwrap();
        assert!(command.on);
        assert_eq!(command.brightness, Some(80));
    }

    #[test]
    fn should_keep_explicit_power_off() {
        let spec = LightStateSpec {
            on: Some(false),
            transition_deciseconds: Some(50),
            ..LightStateSpec::default()
        };
        let command = spec.to_command(light("2")).unwrap();
        assert!(!command.on);
        assert_eq!(command.transition_deciseconds, Some(50));
        assert_eq!(command.brightness, None);
    }

    #[test]
    fn should_resolve_hex_color_to_xy_in_command() {
        let spec = LightStateSpec {
            color: Some(ColorSpec::Hex("#ff0000".to_string())),
            ..LightStateSpec::default()
        };
        let command = spec.to_command(light("1")).unwrap();
        assert!(command.on);
        assert!(matches!(command.color, Some(DeviceColor::Xy(_))));
    }

    #[test]
    fn should_skip_command_when_only_transition_is_set() {
        let spec = LightStateSpec {
            transition_deciseconds: Some(10),
            ..LightStateSpec::default()
        };
        assert!(!spec.is_empty());
        assert_eq!(spec.to_command(light("1")), None);
    }

    #[test]
    fn should_reject_brightness_above_maximum() {
        let spec = LightStateSpec {
            brightness: Some(255),
            ..LightStateSpec::default()
        };
        assert_eq!(
            spec.validate(),
            Err(ValidationError::BrightnessOutOfRange(255))
        );
    }

    #[test]
    fn should_omit_absent_fields_when_serializing_command() {
        let command = LightCommand::on(light("4"), 100, None).with_transition(20);
        let json = serde_json::to_value(&command).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "light_id": "4",
                "on": true,
                "brightness": 100,
                "transition_deciseconds": 20
            })
        );
    }
}
