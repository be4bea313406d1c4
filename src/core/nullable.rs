//! Serde helpers for fields the backend may send as `null`.

use serde::{Deserialize, Deserializer};

/// `#[serde(default, deserialize_with = "null_default::deserialize")]`
///
/// `#[serde(default)]` alone only covers a missing field; this also maps an
/// explicit `null` to `T::default()`.
pub mod null_default {
    use super::*;

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }
}
