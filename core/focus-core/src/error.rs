//! Error types for focus-core operations.
//!
//! Loading paths never surface these: a missing or corrupt log degrades to an
//! empty document. Errors are reserved for writes and explicit configuration.

use std::path::PathBuf;

/// All errors that can occur in focus-core operations.
#[derive(Debug, thiserror::Error)]
pub enum FocusError {
    // ─────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("No data directory could be determined for this user")]
    DataDirNotFound,

    #[error("Configuration file malformed: {path}: {details}")]
    Config { path: PathBuf, details: String },

    // ─────────────────────────────────────────────────────────────────────
    // Store Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Session log path has no parent directory: {0}")]
    InvalidLogPath(PathBuf),

    // ─────────────────────────────────────────────────────────────────────
    // I/O Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FocusError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        FocusError::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        FocusError::Json {
            context: context.into(),
            source,
        }
    }
}

/// Convenience type alias for Results using FocusError.
pub type Result<T> = std::result::Result<T, FocusError>;

impl From<FocusError> for String {
    fn from(err: FocusError) -> String {
        err.to_string()
    }
}
