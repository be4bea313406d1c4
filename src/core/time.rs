//! Timestamp decoding that tolerates the backend's zone-less `LocalDateTime`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Parses RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS[.fff]` (taken as UTC), or a bare date.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Decodes the JSON shapes a timestamp shows up in: a string, epoch
/// milliseconds, or Jackson's `[year, month, day, hour, minute, second, nanos]`.
pub fn timestamp_from_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(raw) => parse_timestamp(raw),
        Value::Number(millis) => millis
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis),
        Value::Array(parts) => {
            let part = |idx: usize| parts.get(idx).and_then(Value::as_i64).unwrap_or(0);
            let year = i32::try_from(parts.first()?.as_i64()?).ok()?;
            let date = NaiveDate::from_ymd_opt(
                year,
                u32::try_from(part(1)).ok()?,
                u32::try_from(part(2)).ok()?,
            )?;
            date.and_hms_nano_opt(
                u32::try_from(part(3)).ok()?,
                u32::try_from(part(4)).ok()?,
                u32::try_from(part(5)).ok()?,
                u32::try_from(part(6)).ok()?,
            )
            .map(|naive| naive.and_utc())
        }
        _ => None,
    }
}

/// `#[serde(default, deserialize_with = "lenient_timestamp::deserialize")]`
///
/// Unparseable values decode as `None` instead of failing the whole record.
pub mod lenient_timestamp {
    use super::*;

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw = Option::<Value>::deserialize(deserializer)?;
        Ok(raw.as_ref().and_then(timestamp_from_value))
    }
}
