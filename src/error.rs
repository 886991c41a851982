//! Error types for rategate
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in rategate
#[derive(Debug, Error)]
pub enum RateGateError {
    /// The gate was built without an application identifier
    #[error("Missing application identifier")]
    MissingIdentifier,

    /// The application metadata provider reported no version string
    #[error("Missing application version")]
    MissingVersion,

    /// No tokio runtime was available to run the prompt dispatcher
    #[error("No tokio runtime available: {0}")]
    NoRuntime(String),

    /// Storage/persistence error
    #[error("Storage error: {0}")]
    Storage(String),

    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for rategate operations
pub type Result<T> = std::result::Result<T, RateGateError>;
