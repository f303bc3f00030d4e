//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp used for `started_at`, `ends_at`, event times, etc.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Convert a (possibly fractional) number of minutes into a [`std::time::Duration`].
///
/// Non-finite or negative input yields a zero duration; values too large for
/// a `Duration` saturate.
#[must_use]
pub fn minutes_to_duration(minutes: f64) -> std::time::Duration {
    if minutes.is_finite() && minutes > 0.0 {
        std::time::Duration::try_from_secs_f64(minutes * 60.0)
            .unwrap_or(std::time::Duration::MAX)
    } else {
        std::time::Duration::ZERO
    }
}
