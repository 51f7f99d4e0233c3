//! Error types for the Keel trust store

use thiserror::Error;

/// Result type alias for trust store operations
pub type Result<T> = std::result::Result<T, TrustError>;

/// Errors that can occur in the trust store
#[derive(Debug, Error)]
pub enum TrustError {
    /// Core library error
    #[error("Core error: {0}")]
    Core(#[from] keel_core::CoreError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Trust token parse error
    #[error("Trust token parse error: {0}")]
    ParseTokens(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for TrustError {
    fn from(e: serde_json::Error) -> Self {
        TrustError::Serialization(e.to_string())
    }
}
