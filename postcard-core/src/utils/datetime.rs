//! Datetime serialization/deserialization helpers.
//!
//! Stored postcards and cache entries were first written by a browser, so the
//! wire format follows `Date.prototype.toISOString()`:
//! - Serialization: `DateTime<Utc>` -> `2025-03-17T00:00:00.000Z`
//! - Deserialization: any RFC3339 string, or a Unix timestamp (`Date.now()`
//!   milliseconds or plain seconds) -> `DateTime<Utc>`
//!
//! Postcard dates are kept as the stored text; `parse_iso` reads them leniently.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Formats like `toISOString()`: millisecond precision, `Z` suffix.
#[must_use]
pub fn to_iso_string(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Lenient ISO-8601 parse: RFC3339, a bare date (`2025-03-17`, midnight UTC),
/// or a date-time without offset (read as UTC).
#[must_use]
pub fn parse_iso(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Serializes `DateTime<Utc>` as an ISO-8601 string.
pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&to_iso_string(dt))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TimestampOrString {
    String(String),
    I64(i64),
    F64(f64),
}

impl TimestampOrString {
    fn into_datetime<E: serde::de::Error>(self) -> Result<DateTime<Utc>, E> {
        match self {
            Self::String(s) => DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| E::custom(format!("Invalid RFC3339 timestamp: {e}"))),
            Self::I64(ts) => {
                parse_unix_timestamp(ts).ok_or_else(|| E::custom("Invalid Unix timestamp"))
            }
            // JSON numbers written by JavaScript may carry a fractional part.
            #[allow(clippy::cast_possible_truncation)]
            Self::F64(ts) => parse_unix_timestamp(ts.trunc() as i64)
                .ok_or_else(|| E::custom("Invalid Unix timestamp")),
        }
    }
}

/// Deserializes `DateTime<Utc>` from RFC3339 or Unix timestamp.
pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    TimestampOrString::deserialize(deserializer)?.into_datetime()
}

/// `Option<DateTime<Utc>>` serializer/deserializer helpers.
pub mod option {
    use super::{to_iso_string, DateTime, Deserialize, Deserializer, Serializer, TimestampOrString, Utc};

    /// Serializes `Option<DateTime<Utc>>` as ISO-8601 or `null`.
    pub fn serialize<S>(dt: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match dt {
            Some(dt) => serializer.serialize_some(&to_iso_string(dt)),
            None => serializer.serialize_none(),
        }
    }

    /// Deserializes `Option<DateTime<Utc>>` from RFC3339, Unix timestamp, or `null`.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<TimestampOrString>::deserialize(deserializer)?
            .map(TimestampOrString::into_datetime)
            .transpose()
    }
}

/// Parses a Unix timestamp with second/millisecond auto-detection.
fn parse_unix_timestamp(ts: i64) -> Option<DateTime<Utc>> {
    // Values larger than 10^11 are interpreted as milliseconds.
    if ts > 100_000_000_000 {
        DateTime::from_timestamp_millis(ts)
    } else {
        DateTime::from_timestamp(ts, 0)
    }
}
