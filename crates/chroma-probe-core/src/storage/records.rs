//! Collection records read from the `collections` table.

use super::{column_optional_text, column_text, open_read_only};
use crate::config::StorageConfig;
use crate::error::Result;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// A row of the `collections` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionRecord {
    pub id: String,
    pub name: String,
    /// Raw `configuration_json_str`; `None` for SQL NULL.
    pub configuration_json: Option<String>,
}

impl CollectionRecord {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: column_text(row, 0)?,
            name: column_text(row, 1)?,
            configuration_json: column_optional_text(row, 2)?,
        })
    }
}

pub(crate) fn select_sql(filter_by_name: bool, limit: bool) -> String {
    let mut sql = format!(
        "SELECT {}, {}, {} FROM {}",
        StorageConfig::ID_COLUMN,
        StorageConfig::NAME_COLUMN,
        StorageConfig::CONFIGURATION_COLUMN,
        StorageConfig::COLLECTIONS_TABLE
    );
    if filter_by_name {
        sql.push_str(&format!(" WHERE {} = ?1", StorageConfig::NAME_COLUMN));
    }
    if limit {
        sql.push_str(" LIMIT ?1");
    }
    sql
}

/// Read every collection record, or only those named `name_filter`.
pub fn read_collections(
    storage_file: &Path,
    name_filter: Option<&str>,
) -> Result<Vec<CollectionRecord>> {
    let conn = open_read_only(storage_file)?;

    let records = match name_filter {
        Some(name) => {
            let mut stmt = conn.prepare(&select_sql(true, false))?;
            let rows = stmt.query_map(params![name], CollectionRecord::from_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        }
        None => {
            let mut stmt = conn.prepare(&select_sql(false, false))?;
            let rows = stmt.query_map([], CollectionRecord::from_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        }
    };

    debug!(
        "Read {} collection records from {}",
        records.len(),
        storage_file.display()
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use crate::storage::test_support::create_storage;
    use tempfile::TempDir;

    #[test]
    fn test_select_sql() {
        assert_eq!(
            select_sql(false, false),
            "SELECT id, name, configuration_json_str FROM collections"
        );
        assert_eq!(
            select_sql(true, false),
            "SELECT id, name, configuration_json_str FROM collections WHERE name = ?1"
        );
        assert!(select_sql(false, true).ends_with("LIMIT ?1"));
    }

    #[test]
    fn test_read_all_collections() {
        let temp = TempDir::new().unwrap();
        let path = create_storage(
            temp.path(),
            &[
                ("abc", "docs", None),
                ("def", "notes", Some(r#"{"hnsw":{"space":"cosine"}}"#)),
            ],
        );

        let records = read_collections(&path, None).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.contains(&CollectionRecord {
            id: "abc".into(),
            name: "docs".into(),
            configuration_json: None,
        }));
    }

    #[test]
    fn test_read_collections_with_filter() {
        let temp = TempDir::new().unwrap();
        let path = create_storage(
            temp.path(),
            &[("abc", "docs", None), ("def", "notes", Some("{}"))],
        );

        let records = read_collections(&path, Some("notes")).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "def");

        // The filter is bound, never spliced into the statement
        let records = read_collections(&path, Some("x' OR '1'='1")).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_read_collections_without_table() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("chroma.sqlite3");
        rusqlite::Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE tenants (id TEXT)")
            .unwrap();

        let err = read_collections(&path, None).unwrap_err();
        assert!(matches!(err, ProbeError::Database { .. }));
    }
}
