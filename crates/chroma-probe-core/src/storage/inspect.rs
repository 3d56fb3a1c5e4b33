//! Read-only schema inspection of a storage file.

use super::records::{select_sql, CollectionRecord};
use super::{open_read_only, table_names};
use crate::config::StorageConfig;
use crate::error::Result;
use rusqlite::params;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A column of the `collections` table as reported by `PRAGMA table_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub declared_type: String,
}

/// Parse state of a sampled configuration blob.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SampledConfiguration {
    Absent,
    Parsed { value: Value },
    Invalid { raw: String, error: String },
}

impl SampledConfiguration {
    fn from_raw(raw: Option<String>) -> Self {
        match raw {
            None => SampledConfiguration::Absent,
            Some(raw) if raw.is_empty() => SampledConfiguration::Absent,
            Some(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(value) => SampledConfiguration::Parsed { value },
                Err(e) => SampledConfiguration::Invalid {
                    raw,
                    error: e.to_string(),
                },
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SampledCollection {
    pub id: String,
    pub name: String,
    pub configuration: SampledConfiguration,
}

/// Structure and sampled contents of the `collections` table.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionsTable {
    pub columns: Vec<ColumnInfo>,
    pub sample: Vec<SampledCollection>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemaReport {
    pub storage_file: PathBuf,
    pub tables: Vec<String>,
    /// Present only when a `collections` table exists.
    pub collections: Option<CollectionsTable>,
}

/// Inspect a storage file, logging and swallowing any failure.
///
/// Returns `None` when the file cannot be opened or queried; callers skip the
/// steps that depend on the report.
pub fn inspect_schema(storage_file: &Path) -> Option<SchemaReport> {
    match try_inspect_schema(storage_file) {
        Ok(report) => Some(report),
        Err(e) => {
            warn!("Error analyzing SQLite {}: {}", storage_file.display(), e);
            None
        }
    }
}

/// Inspect a storage file: table names, and for `collections` its columns
/// and the first [`StorageConfig::SAMPLE_ROW_LIMIT`] rows.
pub fn try_inspect_schema(storage_file: &Path) -> Result<SchemaReport> {
    let conn = open_read_only(storage_file)?;
    let tables = table_names(&conn)?;
    debug!("Tables in {}: {:?}", storage_file.display(), tables);

    let collections = if tables
        .iter()
        .any(|name| name == StorageConfig::COLLECTIONS_TABLE)
    {
        let mut stmt = conn.prepare(&format!(
            "PRAGMA table_info({})",
            StorageConfig::COLLECTIONS_TABLE
        ))?;
        let columns = stmt
            .query_map([], |row| {
                Ok(ColumnInfo {
                    name: row.get(1)?,
                    declared_type: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(&select_sql(false, true))?;
        let sample = stmt
            .query_map(
                params![StorageConfig::SAMPLE_ROW_LIMIT as i64],
                CollectionRecord::from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?
            .into_iter()
            .map(|record| SampledCollection {
                id: record.id,
                name: record.name,
                configuration: SampledConfiguration::from_raw(record.configuration_json),
            })
            .collect();

        Some(CollectionsTable { columns, sample })
    } else {
        None
    };

    Ok(SchemaReport {
        storage_file: storage_file.to_path_buf(),
        tables,
        collections,
    })
}
