//! Error types for the fixture encoders

use thiserror::Error;

/// Result type alias for encoder operations
pub type Result<T> = std::result::Result<T, FixtureError>;

/// Error types that can occur while describing or writing a fixture
#[derive(Error, Debug)]
pub enum FixtureError {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unsupported GGUF version
    #[error("Unsupported GGUF version: {0}")]
    UnsupportedVersion(u32),

    /// Invalid metadata
    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    /// Invalid tensor description
    #[error("Invalid tensor data: {0}")]
    InvalidTensorData(String),

    /// Format error
    #[error("Format error: {0}")]
    Format(String),

    /// Safetensors header could not be serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Fixture manifest could not be parsed
    #[error("Manifest error: {0}")]
    Manifest(#[from] toml::de::Error),
}
