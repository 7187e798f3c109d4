//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp used for observations, sensor samples and events.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Convert the epoch seconds devices report (`syncedTime`, `lastActiveTime`)
/// into a timestamp. Out-of-range values yield `None`.
#[must_use]
pub fn from_epoch_secs(secs: i64) -> Option<Timestamp> {
    DateTime::from_timestamp(secs, 0)
}
