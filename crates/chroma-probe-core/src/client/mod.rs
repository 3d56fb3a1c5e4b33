//! Database client boundary.
//!
//! The tools only need two things from a client: open it against a directory
//! with a named settings variant, and list the collections it sees. Both are
//! expressed as traits so the connectivity tester never depends on how a
//! particular client works internally.

mod connectivity;
mod embedded;

pub use connectivity::{
    test_connectivity, AttemptOutcome, AttemptResult, ConnectivityReport, FailureStage,
};
pub use embedded::EmbeddedClient;

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure raised by a client backend.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("No storage file found in {0}")]
    StorageMissing(PathBuf),

    #[error("Could not open {path}: {message}")]
    Open { path: PathBuf, message: String },

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Collection '{collection}' has an invalid configuration: {message}")]
    InvalidConfiguration { collection: String, message: String },

    /// Failure from a backend with its own error taxonomy.
    #[error("{message}")]
    Backend { kind: String, message: String },
}

impl ClientError {
    /// Stable name of the failure kind, reported next to the message.
    pub fn kind(&self) -> &str {
        match self {
            ClientError::StorageMissing(_) => "StorageMissing",
            ClientError::Open { .. } => "OpenFailed",
            ClientError::Query(_) => "QueryFailed",
            ClientError::InvalidConfiguration { .. } => "InvalidConfiguration",
            ClientError::Backend { kind, .. } => kind,
        }
    }
}

/// A collection as seen through a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionHandle {
    pub id: String,
    pub name: String,
}

/// A named client settings variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientSettings {
    pub label: String,
    /// `None` leaves the client's own default in place.
    pub allow_reset: Option<bool>,
}

impl ClientSettings {
    /// Client opened with nothing but the path.
    pub fn standard() -> Self {
        Self {
            label: "Standard PersistentClient".to_string(),
            allow_reset: None,
        }
    }

    /// Client opened with explicit settings.
    pub fn with_allow_reset(allow_reset: bool) -> Self {
        Self {
            label: "PersistentClient with settings".to_string(),
            allow_reset: Some(allow_reset),
        }
    }

    /// The variants tried when probing compatibility, in order.
    pub fn fallback_variants() -> Vec<Self> {
        vec![Self::standard(), Self::with_allow_reset(false)]
    }
}

impl fmt::Display for ClientSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.allow_reset {
            Some(allow_reset) => write!(f, "{} (allow_reset={})", self.label, allow_reset),
            None => write!(f, "{}", self.label),
        }
    }
}

/// A client that can be opened against a database directory.
pub trait ClientBackend {
    /// Human-readable backend name.
    fn name(&self) -> &str;

    /// Version string of the client, when it has one.
    fn version(&self) -> Option<String> {
        None
    }

    /// Open a persistent client rooted at `path`.
    fn connect(
        &self,
        path: &Path,
        settings: &ClientSettings,
    ) -> Result<Box<dyn CollectionClient>, ClientError>;
}

/// An opened client.
pub trait CollectionClient {
    fn list_collections(&self) -> Result<Vec<CollectionHandle>, ClientError>;
}
