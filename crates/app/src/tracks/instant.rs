//! Instant processor.

use std::collections::HashSet;

use lumen_domain::light::LightCommand;
use lumen_domain::routine::InstantTrack;

/// An instant track that is due and has not fired yet.
#[derive(Debug, Clone, PartialEq)]
pub struct InstantFire {
    pub key: String,
    pub commands: Vec<LightCommand>,
}

/// Return what to fire when the track is due and its key is not in `fired`.
#[must_use]
pub fn plan(
    track: &InstantTrack,
    elapsed_minutes: f64,
    time_scale: f64,
    fired: &HashSet<String>,
) -> Option<InstantFire> {
    if !track.is_due(elapsed_minutes, time_scale) {
        return None;
    }
    let key = track.key();
    if fired.contains(&key) {
        return None;
    }
    let commands = track
        .lights
        .iter()
        .filter_map(|light| track.state.to_command(light.clone()))
        .collect();
    Some(InstantFire { key, commands })
}
