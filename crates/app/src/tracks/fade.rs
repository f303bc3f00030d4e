//! Fade processor and override detection.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;

use lumen_domain::color;
use lumen_domain::id::LightId;
use lumen_domain::light::{LightCommand, LightState};
use lumen_domain::routine::FadeTrack;

use crate::ports::DeviceControl;

/// A reported brightness further than this from the commanded one counts as
/// a manual change.
pub const OVERRIDE_BRIGHTNESS_TOLERANCE: u8 = 20;

/// Override checks run on every n-th tick.
pub const OVERRIDE_CHECK_EVERY: u64 = 3;

/// Commands for one tick of a fade track.
#[derive(Debug, Clone, PartialEq)]
pub struct FadeStep {
    pub brightness: u8,
    pub commands: Vec<LightCommand>,
}

/// Interpolate the track at `elapsed_minutes` and build one command per light.
///
/// Returns `None` for tracks with fewer than two waypoints.
#[must_use]
pub fn plan(
    track: &FadeTrack,
    elapsed_minutes: f64,
    time_scale: f64,
    transition_deciseconds: u16,
) -> Option<FadeStep> {
    let sample = track.sample(elapsed_minutes, time_scale)?;
    let commands = track
        .lights
        .iter()
        .map(|light| {
            LightCommand::on(light.clone(), sample.brightness, sample.color)
                .with_transition(transition_deciseconds)
        })
        .collect();
    Some(FadeStep {
        brightness: sample.brightness,
        commands,
    })
}

/// Transition matching the tick interval, so lights glide from one tick to the next.
#[must_use]
pub fn tick_transition(tick_interval: Duration) -> u16 {
    color::round_u16(tick_interval.as_secs_f64() * 10.0)
}

/// Whether override detection runs on this tick.
#[must_use]
pub fn is_override_check_tick(tick_count: u64) -> bool {
    tick_count % OVERRIDE_CHECK_EVERY == 0
}

/// Why a light is considered manually overridden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum OverrideReason {
    TurnedOff,
    BrightnessChanged { expected: u8, reported: u8 },
}

impl std::fmt::Display for OverrideReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TurnedOff => f.write_str("turned off"),
            Self::BrightnessChanged { expected, reported } => {
                write!(f, "brightness {reported} vs expected {expected}")
            }
        }
    }
}

/// A light that no longer follows the routine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Override {
    pub light_id: LightId,
    pub reason: OverrideReason,
}

/// Compare what a light reports with what it was last told.
#[must_use]
pub fn override_reason(reported: LightState, expected: u8) -> Option<OverrideReason> {
    if !reported.on {
        return Some(OverrideReason::TurnedOff);
    }
    let brightness = reported.brightness?;
    (brightness.abs_diff(expected) > OVERRIDE_BRIGHTNESS_TOLERANCE).then_some(
        OverrideReason::BrightnessChanged {
            expected,
            reported: brightness,
        },
    )
}

/// Read back every light of the track that has an expectation and return the
/// first one that diverges.
///
/// Lights that cannot be read are skipped.
pub async fn detect_override<D: DeviceControl>(
    device: &D,
    track: &FadeTrack,
    expected: &HashMap<LightId, u8>,
) -> Option<Override> {
    for light_id in &track.lights {
        let Some(&expected) = expected.get(light_id) else {
            continue;
        };
        match device.get_light_state(light_id).await {
            Ok(reported) => {
                if let Some(reason) = override_reason(reported, expected) {
                    return Some(Override {
                        light_id: light_id.clone(),
                        reason,
                    });
                }
            }
            Err(err) => {
                tracing::debug!(%light_id, error = ?err, "cannot read light state, skipping override check");
            }
        }
    }
    None
}
