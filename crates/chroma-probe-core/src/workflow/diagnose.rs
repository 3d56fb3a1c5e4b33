//! Full diagnosis of a database directory.

use crate::client::{test_connectivity, ClientBackend, ClientSettings, ConnectivityReport};
use crate::error::Result;
use crate::migration::{create_backup, BackupOutcome};
use crate::storage::{
    inspect_schema, locate_storage_file, probe_directory, DirectoryListing, SchemaReport,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Backup step result; a failed backup does not stop the diagnosis.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "backup", rename_all = "snake_case")]
pub enum BackupStatus {
    Done(BackupOutcome),
    Failed { message: String },
}

/// Follow-up run after the standard connection failed.
#[derive(Debug, Clone, Serialize)]
pub struct RepairAttempt {
    pub backup: BackupStatus,
    pub connectivity: ConnectivityReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosisReport {
    pub database_path: PathBuf,
    pub listing: DirectoryListing,
    pub potential_storage_files: Vec<String>,
    /// `None` when no storage file was found; inspection was skipped.
    pub storage_file: Option<PathBuf>,
    /// `None` when inspection was skipped or failed.
    pub schema: Option<SchemaReport>,
    /// Standard client connection and collection listing.
    pub connection: ConnectivityReport,
    /// Present only when the standard connection failed.
    pub repair_attempt: Option<RepairAttempt>,
}

impl DiagnosisReport {
    /// Whether the standard client opened the database and listed collections.
    pub fn is_compatible(&self) -> bool {
        self.connection.is_success()
    }

    pub fn recommendations(&self) -> Vec<String> {
        if self.is_compatible() {
            return vec!["Database appears to be compatible with current ChromaDB version".into()];
        }
        vec![
            "Upgrade/downgrade ChromaDB to match the database version".into(),
            "Migrate the database using ChromaDB migration tools".into(),
            "Export data from old database and import to new one".into(),
            "Check if there are any ChromaDB configuration flags to handle legacy databases"
                .into(),
        ]
    }
}

/// Probe, inspect and connect to a database directory.
///
/// Only a missing (or non-directory) path is an error. A missing storage file
/// skips schema inspection; the client test always runs. When the standard
/// client fails, a backup is taken and the fallback settings are tried.
pub fn diagnose(database_path: &Path, backend: &dyn ClientBackend) -> Result<DiagnosisReport> {
    let listing = probe_directory(database_path)?;
    let potential_storage_files = listing
        .potential_storage_files()
        .into_iter()
        .map(String::from)
        .collect();

    let storage_file = locate_storage_file(database_path);
    let schema = match &storage_file {
        Some(file) => {
            info!("Analyzing SQLite database: {}", file.display());
            inspect_schema(file)
        }
        None => {
            warn!("No SQLite database file found in {}", database_path.display());
            None
        }
    };

    let connection = test_connectivity(backend, database_path, &[ClientSettings::standard()]);

    let repair_attempt = if connection.is_success() {
        None
    } else {
        let backup = match create_backup(database_path) {
            Ok(outcome) => BackupStatus::Done(outcome),
            Err(e) => {
                warn!("Backup failed: {}", e);
                BackupStatus::Failed {
                    message: e.to_string(),
                }
            }
        };
        let connectivity =
            test_connectivity(backend, database_path, &ClientSettings::fallback_variants());
        Some(RepairAttempt {
            backup,
            connectivity,
        })
    };

    Ok(DiagnosisReport {
        database_path: database_path.to_path_buf(),
        listing,
        potential_storage_files,
        storage_file,
        schema,
        connection,
        repair_attempt,
    })
}
