//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`LumenError`]
//! via `From` so that errors can cross port boundaries without `String`
//! variants.

/// Top-level error shared by every crate in the workspace.
#[derive(Debug, thiserror::Error)]
pub enum LumenError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    #[error("conflict")]
    Conflict(#[from] ConflictError),

    /// The device-control collaborator failed (unreachable bridge, rejected command, …).
    #[error("device error")]
    Device(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The persistence collaborator failed.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A domain invariant was violated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("identifier must not be empty")]
    EmptyId,

    #[error("duration must be a positive number of minutes, at most one year, got {0}")]
    InvalidDuration(f64),

    #[error("track #{track} has no lights")]
    NoLights { track: usize },

    #[error("track #{track} has no waypoints")]
    NoWaypoints { track: usize },

    #[error("track #{track}: waypoint times must be ascending")]
    UnorderedWaypoints { track: usize },

    #[error("time must be a non-negative number of minutes, got {0}")]
    InvalidTime(f64),

    #[error("brightness must be within 0..=254, got {0}")]
    BrightnessOutOfRange(u8),

    #[error("track #{track}: instant state must set at least one field")]
    EmptyInstantState { track: usize },

    #[error("track #{track}: instant state must set power, brightness or color")]
    InstantStateWithoutEffect { track: usize },

    #[error("invalid color: {0}")]
    InvalidColor(String),
}

/// A requested resource does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} `{id}` not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// A resource with the same identifier already exists.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} `{id}` already exists")]
pub struct ConflictError {
    pub entity: &'static str,
    pub id: String,
}
