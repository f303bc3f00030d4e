//! Routine session: the mutable state of one running routine.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use lumen_domain::id::{LightId, RoutineId, SessionId};
use lumen_domain::routine::RoutineDefinition;
use lumen_domain::time::{Timestamp, minutes_to_duration, now};

/// One run of a routine.
///
/// Elapsed time is always measured from `started` on the tokio clock, so a
/// late tick never accumulates drift.
#[derive(Debug, Clone)]
pub struct RoutineSession {
    pub session_id: SessionId,
    pub definition: Arc<RoutineDefinition>,
    pub started: Instant,
    pub started_at: Timestamp,
    pub duration: Duration,
    /// Length of this run in minutes; differs from the definition when started
    /// with a test duration.
    pub effective_duration_minutes: f64,
    pub tick_interval: Duration,
    pub tick_count: u64,
    pub last_expected_brightness: HashMap<LightId, u8>,
    pub fired_instants: HashSet<String>,
}

impl RoutineSession {
    #[must_use]
    pub fn new(
        definition: Arc<RoutineDefinition>,
        effective_duration_minutes: f64,
        tick_interval: Duration,
    ) -> Self {
        Self {
            session_id: SessionId::new(),
            definition,
            started: Instant::now(),
            started_at: now(),
            duration: minutes_to_duration(effective_duration_minutes),
            effective_duration_minutes,
            tick_interval,
            tick_count: 0,
            last_expected_brightness: HashMap::new(),
            fired_instants: HashSet::new(),
        }
    }

    #[must_use]
    pub fn routine_id(&self) -> &RoutineId {
        &self.definition.id
    }

    /// Factor applied to waypoint and instant times.
    #[must_use]
    pub fn time_scale(&self) -> f64 {
        self.effective_duration_minutes / self.definition.duration_minutes
    }

    #[must_use]
    pub fn elapsed(&self, at: Instant) -> Duration {
        at.saturating_duration_since(self.started)
    }

    /// Fraction of the run completed at `at`; may exceed 1.
    #[must_use]
    pub fn progress(&self, at: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        self.elapsed(at).as_secs_f64() / self.duration.as_secs_f64()
    }

    #[must_use]
    pub fn ends_at(&self) -> Timestamp {
        chrono::Duration::from_std(self.duration)
            .map_or(self.started_at, |duration| self.started_at + duration)
    }

    pub fn record_expected(&mut self, light_id: LightId, brightness: u8) {
        self.last_expected_brightness.insert(light_id, brightness);
    }

    /// Mark an instant key as fired. Returns `false` if it already was.
    pub fn mark_fired(&mut self, key: String) -> bool {
        self.fired_instants.insert(key)
    }

    /// Progress report at `at`.
    #[must_use]
    pub fn progress_report(&self, at: Instant) -> SessionProgress {
        let elapsed = self.elapsed(at);
        let remaining = self.duration.saturating_sub(elapsed);
        let percent = (self.progress(at) * 100.0).min(100.0);
        SessionProgress {
            id: self.routine_id().clone(),
            name: self.definition.name.clone(),
            progress_percent: (percent * 10.0).round() / 10.0,
            elapsed_seconds: round_secs(elapsed),
            remaining_seconds: round_secs(remaining),
            tick_count: self.tick_count,
            started_at: self.started_at,
            ends_at: self.ends_at(),
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_secs(duration: Duration) -> u64 {
    duration.as_secs_f64().round() as u64
}

/// Where a running routine stands.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionProgress {
    pub id: RoutineId,
    pub name: String,
    /// Percentage with one decimal, capped at 100.
    pub progress_percent: f64,
    pub elapsed_seconds: u64,
    pub remaining_seconds: u64,
    pub tick_count: u64,
    pub started_at: Timestamp,
    pub ends_at: Timestamp,
}

/// Status of a routine id: inactive, or active with its progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutineStatus {
    pub active: bool,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub progress: Option<SessionProgress>,
}

impl RoutineStatus {
    #[must_use]
    pub fn inactive() -> Self {
        Self {
            active: false,
            progress: None,
        }
    }

    #[must_use]
    pub fn active(progress: SessionProgress) -> Self {
        Self {
            active: true,
            progress: Some(progress),
        }
    }
}
