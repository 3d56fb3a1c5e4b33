//! In-process persistent client.
//!
//! Reads the storage file the same way a Chroma persistent client does on
//! startup: every collection's stored configuration must decode into a known
//! variant selected by `_type`. Legacy rows without the discriminator fail
//! exactly like they do for the official client, which is what makes this
//! backend useful for checking whether a repaired database will load.

use super::{ClientBackend, ClientError, ClientSettings, CollectionClient, CollectionHandle};
use crate::config::StorageConfig;
use crate::storage::{locate_storage_file, CollectionRecord};
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Stored configuration as the client expects to find it.
#[derive(Debug, Deserialize)]
#[serde(tag = "_type")]
enum StoredConfiguration {
    CollectionConfigurationInternal {
        #[serde(default)]
        hnsw: Option<serde_json::Value>,
        #[serde(default)]
        spann: Option<serde_json::Value>,
    },
}

impl StoredConfiguration {
    fn has_index_block(&self) -> bool {
        match self {
            StoredConfiguration::CollectionConfigurationInternal { hnsw, spann } => {
                hnsw.is_some() || spann.is_some()
            }
        }
    }
}

/// Backend that opens the storage file directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedClient;

impl EmbeddedClient {
    pub fn new() -> Self {
        Self
    }
}

impl ClientBackend for EmbeddedClient {
    fn name(&self) -> &str {
        "embedded"
    }

    fn connect(
        &self,
        path: &Path,
        settings: &ClientSettings,
    ) -> Result<Box<dyn CollectionClient>, ClientError> {
        let storage_file = locate_storage_file(path)
            .ok_or_else(|| ClientError::StorageMissing(path.to_path_buf()))?;
        debug!("Opening {} with {}", storage_file.display(), settings);

        // Read-only: probing must never modify the database it diagnoses
        let conn = Connection::open_with_flags(
            &storage_file,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| ClientError::Open {
            path: storage_file.clone(),
            message: e.to_string(),
        })?;

        let has_collections: Option<String> = conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [StorageConfig::COLLECTIONS_TABLE],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| ClientError::Open {
                path: storage_file.clone(),
                message: e.to_string(),
            })?;

        if has_collections.is_none() {
            return Err(ClientError::Open {
                path: storage_file,
                message: format!("no such table: {}", StorageConfig::COLLECTIONS_TABLE),
            });
        }

        Ok(Box::new(EmbeddedConnection { conn, storage_file }))
    }
}

struct EmbeddedConnection {
    conn: Connection,
    storage_file: PathBuf,
}

impl CollectionClient for EmbeddedConnection {
    fn list_collections(&self) -> Result<Vec<CollectionHandle>, ClientError> {
        let sql = format!(
            "SELECT {}, {}, {} FROM {}",
            StorageConfig::ID_COLUMN,
            StorageConfig::NAME_COLUMN,
            StorageConfig::CONFIGURATION_COLUMN,
            StorageConfig::COLLECTIONS_TABLE
        );
        let records = self
            .conn
            .prepare(&sql)
            .and_then(|mut stmt| {
                stmt.query_map([], CollectionRecord::from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()
            })
            .map_err(|e| ClientError::Query(e.to_string()))?;

        let mut handles = Vec::with_capacity(records.len());
        for record in records {
            let raw = record
                .configuration_json
                .as_deref()
                .filter(|raw| !raw.is_empty())
                .ok_or_else(|| ClientError::InvalidConfiguration {
                    collection: record.name.clone(),
                    message: "configuration is missing".to_string(),
                })?;

            let configuration: StoredConfiguration =
                serde_json::from_str(raw).map_err(|e| ClientError::InvalidConfiguration {
                    collection: record.name.clone(),
                    message: e.to_string(),
                })?;

            if !configuration.has_index_block() {
                debug!("Collection {} has no index parameters; defaults apply", record.name);
            }

            handles.push(CollectionHandle {
                id: record.id,
                name: record.name,
            });
        }

        debug!(
            "Listed {} collections from {}",
            handles.len(),
            self.storage_file.display()
        );
        Ok(handles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::create_storage;
    use tempfile::TempDir;

    fn list(dir: &Path) -> Result<Vec<CollectionHandle>, ClientError> {
        EmbeddedClient::new()
            .connect(dir, &ClientSettings::standard())?
            .list_collections()
    }

    #[test]
    fn test_lists_valid_collections() {
        let temp = TempDir::new().unwrap();
        create_storage(
            temp.path(),
            &[
                (
                    "abc",
                    "docs",
                    Some(r#"{"_type":"CollectionConfigurationInternal","hnsw":{"space":"l2"},"embedding_function":{}}"#),
                ),
                (
                    "def",
                    "notes",
                    Some(r#"{"_type":"CollectionConfigurationInternal"}"#),
                ),
            ],
        );

        let handles = list(temp.path()).unwrap();
        assert_eq!(handles.len(), 2);
        assert!(handles.contains(&CollectionHandle {
            id: "abc".into(),
            name: "docs".into()
        }));
    }

    #[test]
    fn test_missing_discriminator_fails_listing() {
        let temp = TempDir::new().unwrap();
        create_storage(temp.path(), &[("abc", "docs", Some(r#"{"hnsw":{}}"#))]);

        let err = list(temp.path()).unwrap_err();
        assert_eq!(err.kind(), "InvalidConfiguration");
        assert!(err.to_string().contains("_type"));
    }

    #[test]
    fn test_unknown_variant_and_absent_fail_listing() {
        let temp = TempDir::new().unwrap();
        create_storage(temp.path(), &[("abc", "docs", Some(r#"{"_type":"Mystery"}"#))]);
        assert!(matches!(
            list(temp.path()),
            Err(ClientError::InvalidConfiguration { .. })
        ));

        let temp = TempDir::new().unwrap();
        create_storage(temp.path(), &[("abc", "docs", None)]);
        assert!(matches!(
            list(temp.path()),
            Err(ClientError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_connect_without_storage_file() {
        let temp = TempDir::new().unwrap();
        let err = EmbeddedClient::new()
            .connect(temp.path(), &ClientSettings::standard())
            .err()
            .unwrap();
        assert!(matches!(err, ClientError::StorageMissing(_)));
        // Nothing was created
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_connect_without_collections_table() {
        let temp = TempDir::new().unwrap();
        Connection::open(temp.path().join("chroma.sqlite3"))
            .unwrap()
            .execute_batch("CREATE TABLE tenants (id TEXT)")
            .unwrap();

        let err = EmbeddedClient::new()
            .connect(temp.path(), &ClientSettings::with_allow_reset(false))
            .err()
            .unwrap();
        assert_eq!(err.kind(), "OpenFailed");
        assert!(err.to_string().contains("no such table: collections"));
    }
}
