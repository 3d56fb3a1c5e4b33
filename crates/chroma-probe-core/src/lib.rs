//! Chroma Probe Core - Headless library for diagnosing Chroma database directories.
//!
//! This crate inspects an on-disk Chroma database, tests whether a client can
//! open it, and repairs stored collection configurations that lack the `_type`
//! discriminator newer clients require. Repairs are never applied directly;
//! they are emitted as a SQL script for manual review.
//!
//! The command-line tools live in the `chroma-probe-cli` crate.
//!
//! # Example
//!
//! ```rust,ignore
//! use chroma_probe_core::{analyze, AnalysisOptions, EmbeddedClient};
//! use std::path::Path;
//!
//! fn main() -> chroma_probe_core::Result<()> {
//!     let report = analyze(
//!         Path::new("./chroma_db"),
//!         &EmbeddedClient::new(),
//!         &AnalysisOptions::default(),
//!     )?;
//!
//!     if let Some(script) = report.configuration.and_then(|c| c.script) {
//!         println!("Review and apply {}", script.path.display());
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod migration;
pub mod repair;
pub mod storage;
pub mod version;
pub mod workflow;

// Re-export commonly used types
pub use client::{
    test_connectivity, ClientBackend, ClientError, ClientSettings, CollectionClient,
    CollectionHandle, ConnectivityReport, EmbeddedClient,
};
pub use error::{ProbeError, Result};
pub use migration::{create_backup, write_script, BackupOutcome, MigrationScript};
pub use repair::{
    classify_configuration, plan_repairs, repair_configuration, ConfigurationStatus, RepairPlan,
    RepairSummary,
};
pub use storage::{
    inspect_schema, locate_storage_file, probe_directory, read_collections, CollectionRecord,
    DirectoryListing, SchemaReport,
};
pub use version::{assess_client_version, VersionAdvice, VersionCompatibility};
pub use workflow::{analyze, diagnose, AnalysisOptions, AnalysisReport, DiagnosisReport};
