//! Waypoint: a keyframe inside a fade track.

use serde::{Deserialize, Serialize};

use crate::color::{self, ColorSpec};
use crate::error::ValidationError;
use crate::light::MAX_BRIGHTNESS;

/// Target brightness (and optionally color) at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Minutes since the routine started, on the routine's nominal timeline.
    pub time: f64,
    #[serde(alias = "bri")]
    pub brightness: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorSpec>,
}

impl Waypoint {
    #[must_use]
    pub fn new(time: f64, brightness: u8) -> Self {
        Self {
            time,
            brightness,
            color: None,
        }
    }

    #[must_use]
    pub fn with_color(mut self, color: ColorSpec) -> Self {
        self.color = Some(color);
        self
    }

    /// Check time, brightness and color ranges.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.time.is_finite() || self.time < 0.0 {
            return Err(ValidationError::InvalidTime(self.time));
        }
        if self.brightness > MAX_BRIGHTNESS {
            return Err(ValidationError::BrightnessOutOfRange(self.brightness));
        }
        if let Some(color) = &self.color {
            color::validate(color)?;
        }
        Ok(())
    }
}
