//! Lenient date parsing for request bodies.
//!
//! Browsers send either full RFC 3339 timestamps (`toISOString()`) or the
//! plain `YYYY-MM-DD` value of a date input. Plain dates are taken as
//! midnight UTC.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, de};

/// Parse an RFC 3339 timestamp or a `YYYY-MM-DD` date.
#[must_use]
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parse a calendar date, accepting a timestamp and keeping its UTC date.
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    parse_datetime(raw).map(|timestamp| timestamp.date_naive())
}

/// `deserialize_with` helper for `Option<DateTime<Utc>>` fields.
///
/// # Errors
///
/// Fails when a present value is neither RFC 3339 nor `YYYY-MM-DD`.
pub fn optional_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|raw| parse_datetime(&raw).ok_or_else(|| invalid(&raw)))
        .transpose()
}

/// `deserialize_with` helper for `Option<NaiveDate>` fields.
///
/// # Errors
///
/// Fails when a present value is neither RFC 3339 nor `YYYY-MM-DD`.
pub fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|raw| parse_date(&raw).ok_or_else(|| invalid(&raw)))
        .transpose()
}

fn invalid<E: de::Error>(raw: &str) -> E {
    E::custom(format!(
        "invalid date `{raw}`, expected RFC 3339 or YYYY-MM-DD"
    ))
}
