//! Error types for the mystery asset tooling

use thiserror::Error;

/// The main error type for asset pipeline operations
#[derive(Debug, Error)]
pub enum MysteryError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Config parse error: {0}")]
    ConfigParse(String),

    #[error("Invalid descriptor {path}: {reason}")]
    InvalidDescriptor { path: String, reason: String },

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Provider returned no image data: {0}")]
    NoImagePayload(String),

    #[error("Verification error: {0}")]
    Verification(String),

    #[error("Image error: {0}")]
    Image(String),

    #[error("Background removal error: {0}")]
    BackgroundRemoval(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for asset pipeline operations
pub type Result<T> = std::result::Result<T, MysteryError>;

impl From<serde_json::Error> for MysteryError {
    fn from(err: serde_json::Error) -> Self {
        MysteryError::Json(err.to_string())
    }
}

impl From<toml::de::Error> for MysteryError {
    fn from(err: toml::de::Error) -> Self {
        MysteryError::ConfigParse(err.to_string())
    }
}
