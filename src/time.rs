use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Unix microseconds, the only time type.
pub type Us = i64;

pub const US_PER_MS: Us = 1_000;
pub const US_PER_SEC: Us = 1_000_000;

pub fn now_us() -> Us {
    Utc::now().timestamp_micros()
}

/// Granularity a storage backend keeps timestamps at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precision {
    /// Microseconds are stored as given.
    #[default]
    Native,
    Millisecond,
    /// Whole seconds, e.g. MySQL `DATETIME` or SQLite text timestamps.
    Second,
}

impl Precision {
    /// Precision of a backend known at deployment time.
    ///
    /// PostgreSQL keeps microseconds; everything else is treated as
    /// whole-second storage.
    pub fn for_backend(name: &str) -> Self {
        if name.to_ascii_lowercase().contains("postgres") {
            Precision::Native
        } else {
            Precision::Second
        }
    }

    fn unit(self) -> Us {
        match self {
            Precision::Native => 1,
            Precision::Millisecond => US_PER_MS,
            Precision::Second => US_PER_SEC,
        }
    }
}

/// Round `t` to the nearest unit of `precision`, ties up.
///
/// Every timestamp entering an in-memory comparison goes through here so it
/// compares equal to the same value read back from the backend.
pub fn round(t: Us, precision: Precision) -> Us {
    let unit = precision.unit();
    if unit == 1 {
        return t;
    }
    let floor = t.div_euclid(unit) * unit;
    let rem = t - floor;
    if rem * 2 >= unit {
        floor.saturating_add(unit)
    } else {
        floor
    }
}

pub fn from_datetime(dt: DateTime<Utc>) -> Us {
    dt.timestamp_micros()
}

/// Date-only values start at midnight UTC.
pub fn from_date(date: NaiveDate) -> Us {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_micros()
}

pub fn to_datetime(t: Us) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_micros(t)
}
