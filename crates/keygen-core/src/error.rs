//! Error taxonomy for the generation and model loading workflows

use thiserror::Error;

/// Failure of a generation request: bad status, transport, or malformed body
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerateError {
    #[error("Server error: {0}")]
    Status(u16),
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("Malformed generation response: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for GenerateError {
    fn from(e: serde_json::Error) -> Self {
        GenerateError::Parse(e.to_string())
    }
}

/// Failure to fetch or decode a key model
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Model fetch returned HTTP {0}")]
    Status(u16),
    #[error("Model fetch failed: {0}")]
    Transport(String),
    #[error("STL decode error: {0}")]
    Decode(String),
    #[error("Model contains no triangles")]
    Empty,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerError {
    #[error("A generation request is already outstanding")]
    AlreadyGenerating,
}
