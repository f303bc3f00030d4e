//! Routine: a named, timed lighting program.
//!
//! A routine runs for `duration_minutes` and drives its lights through
//! [`Track`]s. Fade tracks interpolate between [`Waypoint`]s every tick;
//! instant tracks apply a fixed state once their time has come.

mod track;
mod waypoint;

pub use track::{FadeSample, FadeTrack, InstantTrack, Track};
pub use waypoint::Waypoint;

use serde::{Deserialize, Serialize};

use crate::error::{LumenError, ValidationError};
use crate::id::{LightId, RoutineId};

fn default_override_detection() -> bool {
    true
}

/// A stored routine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineDefinition {
    pub id: RoutineId,
    pub name: String,
    pub duration_minutes: f64,
    /// Cancel the run when a light no longer matches what was last commanded.
    #[serde(default = "default_override_detection")]
    pub override_detection: bool,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl RoutineDefinition {
    /// Create a builder for constructing a [`RoutineDefinition`].
    #[must_use]
    pub fn builder() -> RoutineDefinitionBuilder {
        RoutineDefinitionBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`LumenError::Validation`] when:
    /// - `name` is blank ([`ValidationError::EmptyName`])
    /// - `duration_minutes` is not positive or exceeds one year ([`ValidationError::InvalidDuration`])
    /// - any track is invalid (see [`Track::validate`])
    pub fn validate(&self) -> Result<(), LumenError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        validate_duration(self.duration_minutes)?;
        for (index, track) in self.tracks.iter().enumerate() {
            track.validate(index)?;
        }
        Ok(())
    }

    /// Distinct lights across all tracks, in first-seen order.
    #[must_use]
    pub fn lights(&self) -> Vec<&LightId> {
        let mut lights: Vec<&LightId> = Vec::new();
        for light in self.tracks.iter().flat_map(Track::lights) {
            if !lights.contains(&light) {
                lights.push(light);
            }
        }
        lights
    }

    /// Fade tracks in definition order.
    pub fn fade_tracks(&self) -> impl Iterator<Item = &FadeTrack> {
        self.tracks.iter().filter_map(|track| match track {
            Track::Fade(fade) => Some(fade),
            Track::Instant(_) => None,
        })
    }
}

/// Longest run a routine may last: one year.
pub const MAX_DURATION_MINUTES: f64 = 525_600.0;

/// Check that a duration is a positive number of minutes no longer than
/// [`MAX_DURATION_MINUTES`].
///
/// # Errors
///
/// Returns [`ValidationError::InvalidDuration`] otherwise.
pub fn validate_duration(minutes: f64) -> Result<(), ValidationError> {
    if minutes > 0.0 && minutes <= MAX_DURATION_MINUTES {
        Ok(())
    } else {
        Err(ValidationError::InvalidDuration(minutes))
    }
}

/// Step-by-step builder for [`RoutineDefinition`].
///
/// When no id is given it is derived from the name with [`RoutineId::slugify`].
#[derive(Debug, Default)]
pub struct RoutineDefinitionBuilder {
    id: Option<RoutineId>,
    name: Option<String>,
    duration_minutes: Option<f64>,
    override_detection: Option<bool>,
    tracks: Vec<Track>,
}

impl RoutineDefinitionBuilder {
    #[must_use]
    pub fn id(mut self, id: RoutineId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn duration_minutes(mut self, minutes: f64) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    #[must_use]
    pub fn override_detection(mut self, enabled: bool) -> Self {
        self.override_detection = Some(enabled);
        self
    }

    #[must_use]
    pub fn track(mut self, track: Track) -> Self {
        self.tracks.push(track);
        self
    }

    #[must_use]
    pub fn tracks(mut self, tracks: impl IntoIterator<Item = Track>) -> Self {
        self.tracks.extend(tracks);
        self
    }

    /// Consume the builder, validate, and return a [`RoutineDefinition`].
    ///
    /// Duration defaults to 10 minutes and override detection to enabled.
    ///
    /// # Errors
    ///
    /// Returns [`LumenError::Validation`] if the name is missing or no id can
    /// be derived from it, or if the result is invalid.
    pub fn build(self) -> Result<RoutineDefinition, LumenError> {
        let name = self.name.unwrap_or_default();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        let id = match self.id {
            Some(id) => id,
            None => RoutineId::slugify(&name)?,
        };
        let routine = RoutineDefinition {
            id,
            name,
            duration_minutes: self.duration_minutes.unwrap_or(10.0),
            override_detection: self.override_detection.unwrap_or(true),
            tracks: self.tracks,
        };
        routine.validate()?;
        Ok(routine)
    }
}
