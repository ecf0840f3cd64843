// src/models/nullable.rs

use serde::{Deserialize, Deserializer};

/// Campo anulável de patch: ausente -> `None`, `null` -> `Some(None)`,
/// valor -> `Some(Some(v))`. Sempre junto de `#[serde(default)]`.
pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
