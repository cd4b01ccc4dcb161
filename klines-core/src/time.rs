//! Epoch units used by exchanges for kline timestamps and cursors.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Native unit of an exchange's timestamps. Cursors and records share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampUnit {
    /// Seconds since the Unix epoch.
    Seconds,
    /// Milliseconds since the Unix epoch.
    Milliseconds,
}

impl TimestampUnit {
    /// Ticks per second in this unit.
    #[must_use]
    pub const fn per_second(self) -> i64 {
        match self {
            Self::Seconds => 1,
            Self::Milliseconds => 1_000,
        }
    }

    /// Length of one calendar day (86 400 s or 86 400 000 ms).
    #[must_use]
    pub const fn day(self) -> i64 {
        86_400 * self.per_second()
    }

    /// Convert an instant into this unit.
    #[must_use]
    pub fn from_datetime(self, dt: DateTime<Utc>) -> i64 {
        match self {
            Self::Seconds => dt.timestamp(),
            Self::Milliseconds => dt.timestamp_millis(),
        }
    }

    /// Convert a timestamp in this unit back into an instant.
    ///
    /// Returns `None` when the value is outside chrono's representable range.
    #[must_use]
    pub fn to_datetime(self, ts: i64) -> Option<DateTime<Utc>> {
        match self {
            Self::Seconds => DateTime::from_timestamp(ts, 0),
            Self::Milliseconds => DateTime::from_timestamp_millis(ts),
        }
    }

    /// UTC calendar day containing `ts`.
    #[must_use]
    pub fn calendar_day(self, ts: i64) -> Option<NaiveDate> {
        self.to_datetime(ts).map(|dt| dt.date_naive())
    }

    /// Timestamp of UTC midnight opening `day`.
    #[must_use]
    pub fn day_start(self, day: NaiveDate) -> i64 {
        self.from_datetime(day.and_time(NaiveTime::MIN).and_utc())
    }
}
