//! Multi-variant client connectivity test.

use super::{ClientBackend, ClientError, ClientSettings, CollectionHandle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Where an attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Connect,
    ListCollections,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum AttemptResult {
    Succeeded {
        collections: Vec<CollectionHandle>,
    },
    Failed {
        stage: FailureStage,
        kind: String,
        message: String,
    },
}

impl AttemptResult {
    fn failed(stage: FailureStage, err: &ClientError) -> Self {
        AttemptResult::Failed {
            stage,
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

/// One settings variant and how it fared.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptOutcome {
    pub settings: ClientSettings,
    #[serde(flatten)]
    pub result: AttemptResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectivityReport {
    pub backend: String,
    pub path: PathBuf,
    /// Attempts in the order they ran; stops after the first success.
    pub attempts: Vec<AttemptOutcome>,
}

impl ConnectivityReport {
    pub fn is_success(&self) -> bool {
        self.succeeded().is_some()
    }

    /// The successful attempt, if any.
    pub fn succeeded(&self) -> Option<&AttemptOutcome> {
        self.attempts
            .iter()
            .find(|attempt| matches!(attempt.result, AttemptResult::Succeeded { .. }))
    }

    /// Collections listed by the successful attempt.
    pub fn collections(&self) -> Option<&[CollectionHandle]> {
        self.succeeded().and_then(|attempt| match &attempt.result {
            AttemptResult::Succeeded { collections } => Some(collections.as_slice()),
            AttemptResult::Failed { .. } => None,
        })
    }
}

/// Open `path` with each variant in order until one can list collections.
///
/// Every failure is recorded with its stage, kind and message; the first
/// success ends the run without trying the remaining variants. With no
/// variants the report is an immediate failure.
pub fn test_connectivity(
    backend: &dyn ClientBackend,
    path: &Path,
    variants: &[ClientSettings],
) -> ConnectivityReport {
    let mut attempts = Vec::with_capacity(variants.len());

    for settings in variants {
        debug!("Trying {} with {}", backend.name(), settings);

        let result = match backend.connect(path, settings) {
            Ok(client) => match client.list_collections() {
                Ok(collections) => AttemptResult::Succeeded { collections },
                Err(e) => {
                    warn!("Error listing collections with {}: {}", settings, e);
                    AttemptResult::failed(FailureStage::ListCollections, &e)
                }
            },
            Err(e) => {
                warn!("Error connecting with {}: {}", settings, e);
                AttemptResult::failed(FailureStage::Connect, &e)
            }
        };

        let succeeded = matches!(result, AttemptResult::Succeeded { .. });
        attempts.push(AttemptOutcome {
            settings: settings.clone(),
            result,
        });
        if succeeded {
            break;
        }
    }

    ConnectivityReport {
        backend: backend.name().to_string(),
        path: path.to_path_buf(),
        attempts,
    }
}
