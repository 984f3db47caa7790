//! Wire types of the key generation service

use serde::{Deserialize, Deserializer};

use crate::error::GenerateError;

/// Body of a successful `POST /generate`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenerateResponse {
    /// Server-assigned key identifier (the service sends an integer; strings are accepted too)
    #[serde(deserialize_with = "key_id_as_string")]
    pub key_id: String,
    /// STL location, relative to the service origin
    pub stl_url: String,
}

impl GenerateResponse {
    pub fn from_json(body: &str) -> Result<Self, GenerateError> {
        Ok(serde_json::from_str(body)?)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum KeyIdRepr {
    Int(u64),
    Str(String),
}

fn key_id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match KeyIdRepr::deserialize(deserializer)? {
        KeyIdRepr::Int(id) => id.to_string(),
        KeyIdRepr::Str(id) => id,
    })
}
