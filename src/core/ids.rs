//! Numeric id coercion and client-side id synthesis.
//!
//! Different backends (and older local snapshots) disagree on whether ids are
//! JSON numbers or strings. Every id is normalized to `i64` at decode time so
//! records from both sources compare equal.

use chrono::Utc;
use serde::de::{self, Deserializer, Unexpected, Visitor};
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

struct NumericIdVisitor;

impl<'de> Visitor<'de> for NumericIdVisitor {
    type Value = i64;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an integer id or a string holding one")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
        Ok(v)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
        i64::try_from(v).map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
        if v.fract() == 0.0 && v >= i64::MIN as f64 && v <= i64::MAX as f64 {
            Ok(v as i64)
        } else {
            Err(E::invalid_value(Unexpected::Float(v), &self))
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
        parse_numeric_id(v).ok_or_else(|| E::invalid_value(Unexpected::Str(v), &self))
    }
}

/// Parses a textual id such as `"7"` or `" 7.0 "`.
pub fn parse_numeric_id(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(id) = trimmed.parse::<i64>() {
        return Some(id);
    }
    let float = trimmed.parse::<f64>().ok()?;
    (float.is_finite() && float.fract() == 0.0).then_some(float as i64)
}

/// `#[serde(deserialize_with = "numeric_id::deserialize")]`
pub mod numeric_id {
    use super::*;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        deserializer.deserialize_any(NumericIdVisitor)
    }
}

/// Optional flavour; `null` and the empty string decode as `None`.
pub mod optional_numeric_id {
    use super::*;

    struct OptionalVisitor;

    impl<'de> Visitor<'de> for OptionalVisitor {
        type Value = Option<i64>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an optional integer id")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            d.deserialize_any(self)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            NumericIdVisitor.visit_i64(v).map(Some)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            NumericIdVisitor.visit_u64(v).map(Some)
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            NumericIdVisitor.visit_f64(v).map(Some)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            if v.trim().is_empty() {
                return Ok(None);
            }
            NumericIdVisitor.visit_str(v).map(Some)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<i64>, D::Error> {
        deserializer.deserialize_option(OptionalVisitor)
    }
}

/// Hands out timestamp-derived ids for locally synthesized records.
///
/// Ids are the current Unix time in milliseconds, bumped so that every id is
/// strictly greater than the previous one handed out by this generator.
#[derive(Debug, Default)]
pub struct LocalIdGenerator {
    last: AtomicI64,
}

impl LocalIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let mut current = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(current + 1);
            match self.last.compare_exchange_weak(
                current,
                candidate,
                Ordering::SeqCst,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate,
                Err(observed) => current = observed,
            }
        }
    }

    /// Next id that does not collide with any of `taken`.
    pub fn next_free_id(&self, taken: impl Fn(i64) -> bool) -> i64 {
        loop {
            let id = self.next_id();
            if !taken(id) {
                return id;
            }
        }
    }
}
