//! Version compatibility analysis with configuration repair.

use crate::client::{test_connectivity, ClientBackend, ClientSettings, ConnectivityReport};
use crate::error::{ProbeError, Result};
use crate::migration::{write_script, MigrationScript};
use crate::repair::{plan_repairs, RepairPlan, RepairSummary};
use crate::storage::{locate_storage_file, read_collections};
use crate::version::{assess_client_version, VersionAdvice};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    /// Only analyze the collection with this name.
    pub collection: Option<String>,
    /// Client version to assess; falls back to the backend's own version.
    pub client_version: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum VersionCheck {
    Assessed(VersionAdvice),
    Invalid { version: String, message: String },
}

/// The written migration script.
#[derive(Debug, Clone, Serialize)]
pub struct ScriptArtifact {
    pub path: PathBuf,
    pub statements: usize,
    pub apply_instructions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigurationAnalysis {
    pub storage_file: Option<PathBuf>,
    /// Why the configurations could not be read, when they could not.
    pub error: Option<String>,
    pub plans: Vec<RepairPlan>,
    pub summary: RepairSummary,
    pub script: Option<ScriptArtifact>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub database_path: PathBuf,
    pub collection_filter: Option<String>,
    pub version: Option<VersionCheck>,
    pub connectivity: ConnectivityReport,
    /// Present only when every client variant failed.
    pub configuration: Option<ConfigurationAnalysis>,
}

impl AnalysisReport {
    pub fn is_compatible(&self) -> bool {
        self.connectivity.is_success()
    }

    pub fn recommendations(&self) -> Vec<String> {
        if self.is_compatible() {
            return Vec::new();
        }
        let mut out = Vec::new();
        if self
            .configuration
            .as_ref()
            .and_then(|c| c.script.as_ref())
            .is_some()
        {
            out.push("IMMEDIATE FIX: Apply the generated migration script".to_string());
        }
        out.push("VERSION FIX: Consider upgrading ChromaDB: pip install 'chromadb>=1.0.7'".into());
        out.push("COMPATIBILITY: Ensure all ChromaDB clients use the same version".into());
        out.push("BACKUP: Always backup your database before applying migrations".into());
        out
    }
}

/// Check the client version, try every client variant, and when all fail,
/// classify stored configurations and write a migration script.
///
/// Errors only on a missing database path or a failed script write.
pub fn analyze(
    database_path: &Path,
    backend: &dyn ClientBackend,
    options: &AnalysisOptions,
) -> Result<AnalysisReport> {
    let version = options
        .client_version
        .clone()
        .or_else(|| backend.version())
        .map(|raw| match assess_client_version(&raw) {
            Ok(advice) => VersionCheck::Assessed(advice),
            Err(e) => {
                warn!("{}", e);
                VersionCheck::Invalid {
                    version: raw,
                    message: e.to_string(),
                }
            }
        });

    if !database_path.exists() {
        return Err(ProbeError::PathNotFound(database_path.to_path_buf()));
    }

    let connectivity =
        test_connectivity(backend, database_path, &ClientSettings::fallback_variants());

    let configuration = if connectivity.is_success() {
        None
    } else {
        Some(analyze_configurations(database_path, options.collection.as_deref())?)
    };

    Ok(AnalysisReport {
        database_path: database_path.to_path_buf(),
        collection_filter: options.collection.clone(),
        version,
        connectivity,
        configuration,
    })
}

fn analyze_configurations(
    database_path: &Path,
    collection: Option<&str>,
) -> Result<ConfigurationAnalysis> {
    let Some(storage_file) = locate_storage_file(database_path) else {
        warn!("Could not find ChromaDB SQLite file in {}", database_path.display());
        return Ok(ConfigurationAnalysis {
            storage_file: None,
            error: Some("Could not find ChromaDB SQLite file".into()),
            plans: Vec::new(),
            summary: RepairSummary::default(),
            script: None,
        });
    };

    let records = match read_collections(&storage_file, collection) {
        Ok(records) => records,
        Err(e) => {
            warn!("Error analyzing SQLite database: {}", e);
            return Ok(ConfigurationAnalysis {
                storage_file: Some(storage_file),
                error: Some(e.to_string()),
                plans: Vec::new(),
                summary: RepairSummary::default(),
                script: None,
            });
        }
    };

    let plans = plan_repairs(&records);
    let summary = RepairSummary::from_plans(&plans);
    info!(
        "{} of {} collections need configuration repair",
        summary.problems(),
        summary.total
    );

    let script = if summary.problems() > 0 {
        let script = MigrationScript::build(database_path, &plans)?;
        let path = write_script(&script)?;
        Some(ScriptArtifact {
            apply_instructions: script.apply_instructions(&path),
            statements: script.statements.len(),
            path,
        })
    } else {
        None
    };

    Ok(ConfigurationAnalysis {
        storage_file: Some(storage_file),
        error: None,
        plans,
        summary,
        script,
    })
}
