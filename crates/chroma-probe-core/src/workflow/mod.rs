//! End-to-end runs behind the two command-line tools.
//!
//! Each run is a single linear pass that returns a serializable report; the
//! binaries decide how to print it.

mod analysis;
mod diagnose;

pub use analysis::{
    analyze, AnalysisOptions, AnalysisReport, ConfigurationAnalysis, ScriptArtifact, VersionCheck,
};
pub use diagnose::{diagnose, BackupStatus, DiagnosisReport, RepairAttempt};
