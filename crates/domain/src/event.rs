//! Event: an immutable record of something that happened.
//!
//! Events are produced when routines are created, changed, started,
//! completed or cancelled, and when a run detects a manual override or
//! fires an instant track.

use serde::{Deserialize, Serialize};

use crate::id::{EventId, RoutineId};
use crate::time::{Timestamp, now};

/// What kind of thing happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    RoutineCreated,
    RoutineUpdated,
    RoutineDeleted,
    RoutineStarted,
    RoutineCompleted,
    RoutineCancelled,
    OverrideDetected,
    InstantFired,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::RoutineCreated => "routine_created",
            Self::RoutineUpdated => "routine_updated",
            Self::RoutineDeleted => "routine_deleted",
            Self::RoutineStarted => "routine_started",
            Self::RoutineCompleted => "routine_completed",
            Self::RoutineCancelled => "routine_cancelled",
            Self::OverrideDetected => "override_detected",
            Self::InstantFired => "instant_fired",
        };
        f.write_str(name)
    }
}

/// An immutable record of something that happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub event_type: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routine_id: Option<RoutineId>,
    pub data: serde_json::Value,
    pub timestamp: Timestamp,
}

impl Event {
    /// Record an event that happened now.
    #[must_use]
    pub fn new(
        event_type: EventType,
        routine_id: Option<RoutineId>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            id: EventId::new(),
            event_type,
            routine_id,
            data,
            timestamp: now(),
        }
    }
}
