use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A UTC point in time, serialized as RFC 3339.
///
/// Thin wrapper over [`chrono::DateTime<Utc>`] so call sites read `Timestamp`
/// rather than the fully qualified chrono type, and so we have one place to
/// hang helper methods like [`Timestamp::is_future`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// The current instant.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Wrap an existing `chrono` timestamp.
    #[must_use]
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// The wrapped `chrono` timestamp.
    #[must_use]
    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Whether this timestamp is later than now.
    #[must_use]
    pub fn is_future(&self) -> bool {
        self.0 > Utc::now()
    }

    /// Seconds elapsed since this timestamp, clamped to zero if it is in the future.
    #[must_use]
    pub fn elapsed_seconds(&self) -> i64 {
        (Utc::now() - self.0).num_seconds().max(0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}
