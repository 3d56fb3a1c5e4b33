//! Error types for chroma-probe.
//!
//! Only conditions that stop a step are errors. A malformed collection
//! configuration is data and is reported through
//! [`ConfigurationStatus`](crate::repair::ConfigurationStatus) instead.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the chroma-probe library.
#[derive(Debug, Error)]
pub enum ProbeError {
    // Path errors
    #[error("Database path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),

    // Storage errors
    #[error("Failed to open storage file {path}: {source}")]
    StorageOpen {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Artifact errors
    #[error("Failed to write migration script to {path}: {source}")]
    ScriptWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to back up {src} to {dest}: {message}")]
    Backup {
        src: PathBuf,
        dest: PathBuf,
        message: String,
    },

    #[error("Invalid client version {version:?}: {message}")]
    Version { version: String, message: String },
}

/// Result type alias for chroma-probe operations.
pub type Result<T> = std::result::Result<T, ProbeError>;

impl From<std::io::Error> for ProbeError {
    fn from(err: std::io::Error) -> Self {
        ProbeError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for ProbeError {
    fn from(err: serde_json::Error) -> Self {
        ProbeError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<rusqlite::Error> for ProbeError {
    fn from(err: rusqlite::Error) -> Self {
        ProbeError::Database {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl ProbeError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        ProbeError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Whether the run cannot continue past this error.
    ///
    /// Path and script-write failures end the run; everything else is
    /// reported and the pipeline moves on.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ProbeError::PathNotFound(_)
                | ProbeError::NotADirectory(_)
                | ProbeError::ScriptWrite { .. }
        )
    }
}
