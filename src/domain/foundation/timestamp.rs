//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};

/// Highest epoch-millisecond value handed out by [`Timestamp::now_monotonic`].
static LAST_MONOTONIC_MILLIS: AtomicI64 = AtomicI64::new(i64::MIN);

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a millisecond-precision timestamp that never goes backwards
    /// within this process, even if the wall clock is stepped back.
    pub fn now_monotonic() -> Self {
        let now = Utc::now().timestamp_millis();
        let previous = LAST_MONOTONIC_MILLIS.fetch_max(now, Ordering::SeqCst);
        Self::from_epoch_millis(previous.max(now)).unwrap_or_else(Self::now)
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Creates a timestamp from milliseconds since the Unix epoch.
    ///
    /// Returns `None` when the value is outside chrono's representable range.
    pub fn from_epoch_millis(millis: i64) -> Option<Self> {
        DateTime::from_timestamp_millis(millis).map(Self)
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Milliseconds since the Unix epoch.
    pub fn epoch_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Checks if this timestamp is before another.
    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

/// Serde adapter that writes a [`Timestamp`] as epoch milliseconds.
///
/// Used by the change-event envelope; entity payloads keep RFC 3339.
pub mod epoch_millis {
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::Timestamp;

    pub fn serialize<S>(timestamp: &Timestamp, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(timestamp.epoch_millis())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Timestamp, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = i64::deserialize(deserializer)?;
        Timestamp::from_epoch_millis(millis)
            .ok_or_else(|| de::Error::custom(format!("timestamp out of range: {millis}")))
    }
}
