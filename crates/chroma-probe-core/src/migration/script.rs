//! SQL migration script generation.

use crate::config::{MigrationConfig, RepairConfig, StorageConfig};
use crate::error::Result;
use crate::repair::{RepairBasis, RepairPlan};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Quote `value` as a SQL string literal, doubling embedded single quotes.
pub fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Flatten `text` onto one line so it cannot escape a `--` comment.
fn comment_text(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

/// One `UPDATE` in the generated script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptStatement {
    pub id: String,
    pub name: String,
    pub configuration_json: String,
    pub default_substituted: bool,
}

impl ScriptStatement {
    /// Single-line `UPDATE` keyed by the collection id.
    pub fn update_sql(&self) -> String {
        format!(
            "UPDATE {} SET {} = {} WHERE {} = {};",
            StorageConfig::COLLECTIONS_TABLE,
            StorageConfig::CONFIGURATION_COLUMN,
            sql_literal(&self.configuration_json),
            StorageConfig::ID_COLUMN,
            sql_literal(&self.id)
        )
    }

    fn comment(&self) -> String {
        if self.default_substituted {
            format!(
                "-- Fix collection with default config: {}",
                comment_text(&self.name)
            )
        } else {
            format!("-- Fix collection: {}", comment_text(&self.name))
        }
    }
}

/// A transaction of configuration updates for one database.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationScript {
    pub database_path: PathBuf,
    pub generated_at: String,
    pub statements: Vec<ScriptStatement>,
}

impl MigrationScript {
    /// Build a script from repair plans; plans without a correction are skipped.
    pub fn build(database_path: &Path, plans: &[RepairPlan]) -> Result<Self> {
        let mut statements = Vec::new();
        for plan in plans {
            if let Some(configuration_json) = plan.corrected_json()? {
                statements.push(ScriptStatement {
                    id: plan.id.clone(),
                    name: plan.name.clone(),
                    configuration_json,
                    default_substituted: plan.basis == RepairBasis::DefaultSubstituted,
                });
            }
        }

        Ok(Self {
            database_path: database_path.to_path_buf(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            statements,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Render the script text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = writeln!(out, "-- ChromaDB Configuration Migration Script");
        let _ = writeln!(
            out,
            "-- Generated for database: {}",
            comment_text(&self.database_path.display().to_string())
        );
        let _ = writeln!(out, "-- Generated at: {}", self.generated_at);
        let _ = writeln!(
            out,
            "-- Fixes missing '{}' fields in collection configurations",
            RepairConfig::DISCRIMINATOR_KEY
        );
        out.push('\n');
        out.push_str("BEGIN TRANSACTION;\n\n");

        for statement in &self.statements {
            let _ = writeln!(out, "{}", statement.comment());
            let _ = writeln!(out, "{}", statement.update_sql());
            out.push('\n');
        }

        out.push_str("COMMIT;\n\n");
        out.push_str("-- Verify the changes\n");
        let _ = writeln!(
            out,
            "SELECT {}, {}, {} FROM {};",
            StorageConfig::ID_COLUMN,
            StorageConfig::NAME_COLUMN,
            StorageConfig::CONFIGURATION_COLUMN,
            StorageConfig::COLLECTIONS_TABLE
        );
        out
    }

    /// Manual steps for applying the script.
    pub fn apply_instructions(&self, script_path: &Path) -> Vec<String> {
        let db = self.database_path.display();
        let storage = crate::storage::locate_storage_file(&self.database_path).unwrap_or_else(
            || self.database_path.join(StorageConfig::CANDIDATE_FILE_NAMES[0]),
        );
        vec![
            format!(
                "Backup your database: cp -r '{}' '{}{}'",
                db,
                db,
                MigrationConfig::BACKUP_SUFFIX
            ),
            format!(
                "Apply the script: sqlite3 '{}' < '{}'",
                storage.display(),
                script_path.display()
            ),
            "Test the database with ChromaDB".to_string(),
        ]
    }
}

/// Where the script for `database_path` is written: next to the directory.
pub fn script_path(database_path: &Path) -> PathBuf {
    let parent = database_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    parent.join(MigrationConfig::SCRIPT_FILE_NAME)
}
