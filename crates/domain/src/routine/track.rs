//! Track: a set of lights driven either continuously (fade) or once (instant).

use serde::{Deserialize, Serialize};

use super::Waypoint;
use crate::color::{self, DeviceColor};
use crate::error::ValidationError;
use crate::id::LightId;
use crate::light::LightStateSpec;

/// One lane of a routine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Track {
    Fade(FadeTrack),
    Instant(InstantTrack),
}

impl Track {
    /// Lights this track drives.
    #[must_use]
    pub fn lights(&self) -> &[LightId] {
        match self {
            Self::Fade(track) => &track.lights,
            Self::Instant(track) => &track.lights,
        }
    }

    /// Check the track's invariants. `index` is used in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the track has no lights, a fade track
    /// has no waypoints or unordered waypoints, or an instant track has an
    /// empty or out-of-range payload.
    pub fn validate(&self, index: usize) -> Result<(), ValidationError> {
        if self.lights().is_empty() {
            return Err(ValidationError::NoLights { track: index });
        }
        match self {
            Self::Fade(track) => track.validate(index),
            Self::Instant(track) => track.validate(index),
        }
    }
}

/// Brightness and color interpolated between waypoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeSample {
    pub brightness: u8,
    pub color: Option<DeviceColor>,
}

impl FadeSample {
    fn at(waypoint: &Waypoint) -> Self {
        Self {
            brightness: waypoint.brightness,
            color: color::resolve_device_color(waypoint.color.as_ref()),
        }
    }
}

/// Lights fading through a list of waypoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FadeTrack {
    pub lights: Vec<LightId>,
    pub waypoints: Vec<Waypoint>,
}

impl FadeTrack {
    fn validate(&self, index: usize) -> Result<(), ValidationError> {
        if self.waypoints.is_empty() {
            return Err(ValidationError::NoWaypoints { track: index });
        }
        for waypoint in &self.waypoints {
            waypoint.validate()?;
        }
        if self.waypoints.windows(2).any(|pair| pair[1].time < pair[0].time) {
            return Err(ValidationError::UnorderedWaypoints { track: index });
        }
        Ok(())
    }

    /// State the lights snap to when the routine starts.
    #[must_use]
    pub fn initial(&self) -> Option<FadeSample> {
        self.waypoints.first().map(FadeSample::at)
    }

    /// State the lights snap to when the routine completes.
    #[must_use]
    pub fn last(&self) -> Option<FadeSample> {
        self.waypoints.last().map(FadeSample::at)
    }

    /// Interpolate the state at `elapsed_minutes`, with waypoint times
    /// multiplied by `time_scale`.
    ///
    /// Before the first waypoint the first segment is used at `t = 0`; past
    /// the last waypoint the last segment is used at `t = 1`. A zero-length
    /// segment counts as already reached. Returns `None` when the track has
    /// fewer than two waypoints.
    #[must_use]
    pub fn sample(&self, elapsed_minutes: f64, time_scale: f64) -> Option<FadeSample> {
        let waypoints = &self.waypoints;
        if waypoints.len() < 2 {
            return None;
        }
        let at = |waypoint: &Waypoint| waypoint.time * time_scale;

        let (prev, next, t) = if elapsed_minutes < at(&waypoints[0]) {
            (&waypoints[0], &waypoints[1], 0.0)
        } else if let Some(pair) = waypoints
            .windows(2)
            .find(|pair| elapsed_minutes >= at(&pair[0]) && elapsed_minutes < at(&pair[1]))
        {
            let start = at(&pair[0]);
            let length = at(&pair[1]) - start;
            let t = if length > 0.0 {
                ((elapsed_minutes - start) / length).clamp(0.0, 1.0)
            } else {
                1.0
            };
            (&pair[0], &pair[1], t)
        } else {
            let last = waypoints.len() - 1;
            (&waypoints[last - 1], &waypoints[last], 1.0)
        };

        Some(FadeSample {
            brightness: color::round_u8(color::lerp(
                f64::from(prev.brightness),
                f64::from(next.brightness),
                t,
            )),
            color: color::interpolate_color(prev.color.as_ref(), next.color.as_ref(), t),
        })
    }
}

/// Lights set once, at a fixed point in the routine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstantTrack {
    pub lights: Vec<LightId>,
    /// Minutes since the routine started, on the routine's nominal timeline.
    pub time: f64,
    pub state: LightStateSpec,
}

impl InstantTrack {
    fn validate(&self, index: usize) -> Result<(), ValidationError> {
        if !self.time.is_finite() || self.time < 0.0 {
            return Err(ValidationError::InvalidTime(self.time));
        }
        if self.state.is_empty() {
            return Err(ValidationError::EmptyInstantState { track: index });
        }
        if !self.state.has_effect() {
            return Err(ValidationError::InstantStateWithoutEffect { track: index });
        }
        self.state.validate()
    }

    /// Deduplication key: two instant tracks with the same lights and time
    /// fire once between them.
    #[must_use]
    pub fn key(&self) -> String {
        let lights: Vec<&str> = self.lights.iter().map(LightId::as_str).collect();
        format!("instant_{}_{}", lights.join(","), self.time)
    }

    /// Whether the trigger time has been reached. A non-positive scale is
    /// treated as 1.
    #[must_use]
    pub fn is_due(&self, elapsed_minutes: f64, time_scale: f64) -> bool {
        let scale = if time_scale > 0.0 { time_scale } else { 1.0 };
        elapsed_minutes >= self.time * scale
    }
}
