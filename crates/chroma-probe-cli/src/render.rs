//! Human-readable report output.

use chroma_probe_core::client::{AttemptResult, FailureStage};
use chroma_probe_core::repair::RepairBasis;
use chroma_probe_core::storage::{EntryKind, SampledConfiguration};
use chroma_probe_core::version::VersionCompatibility;
use chroma_probe_core::workflow::{BackupStatus, ConfigurationAnalysis, VersionCheck};
use chroma_probe_core::{
    AnalysisReport, BackupOutcome, ConfigurationStatus, ConnectivityReport, DiagnosisReport,
    SchemaReport,
};
use std::io::{self, Write};

const RULE_WIDTH: usize = 50;

fn title(out: &mut impl Write, text: &str) -> io::Result<()> {
    writeln!(out, "{}", text)?;
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))
}

fn section(out: &mut impl Write, text: &str) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "=== {} ===", text)
}

fn numbered(out: &mut impl Write, items: &[String]) -> io::Result<()> {
    for (i, item) in items.iter().enumerate() {
        writeln!(out, "  {}. {}", i + 1, item)?;
    }
    Ok(())
}

/// Print a `chroma-diagnose` report.
pub fn render_diagnosis(
    out: &mut impl Write,
    report: &DiagnosisReport,
    backend: &str,
) -> io::Result<()> {
    title(out, "ChromaDB Database Diagnostic Tool")?;
    writeln!(
        out,
        "=== Analyzing ChromaDB at: {} ===",
        report.database_path.display()
    )?;
    writeln!(out, "Client backend: {}", backend)?;

    writeln!(out)?;
    writeln!(out, "Database files:")?;
    for entry in &report.listing.entries {
        match entry.kind {
            EntryKind::File => writeln!(
                out,
                "  {} ({} bytes)",
                entry.name,
                entry.size_bytes.unwrap_or(0)
            )?,
            EntryKind::Directory => writeln!(out, "  {}/ (directory)", entry.name)?,
            EntryKind::Other => writeln!(out, "  {} (unreadable)", entry.name)?,
        }
    }
    writeln!(
        out,
        "\nPotential SQLite files: {:?}",
        report.potential_storage_files
    )?;

    match (&report.storage_file, &report.schema) {
        (Some(file), schema) => {
            writeln!(out, "\nAnalyzing SQLite database: {}", file.display())?;
            match schema {
                Some(schema) => render_schema(out, schema)?,
                None => writeln!(out, "  Error analyzing SQLite: see log output")?,
            }
        }
        (None, _) => writeln!(out, "WARNING: No SQLite database file found")?,
    }

    section(out, "Testing ChromaDB Client Connection")?;
    render_standard_connection(out, &report.connection)?;

    if let Some(attempt) = &report.repair_attempt {
        section(out, "Attempting Migration/Repair")?;
        match &attempt.backup {
            BackupStatus::Done(BackupOutcome::Created { path, files, bytes }) => writeln!(
                out,
                "Created backup at: {} ({} files, {} bytes)",
                path.display(),
                files,
                bytes
            )?,
            BackupStatus::Done(BackupOutcome::AlreadyExists { path }) => writeln!(
                out,
                "Backup already exists at: {} (left untouched)",
                path.display()
            )?,
            BackupStatus::Failed { message } => writeln!(out, "Backup failed: {}", message)?,
        }
        render_attempts(out, &attempt.connectivity)?;
    }

    section(out, "Recommendations")?;
    let recommendations = report.recommendations();
    if report.is_compatible() {
        for line in &recommendations {
            writeln!(out, "✓ {}", line)?;
        }
    } else {
        writeln!(out, "✗ Database has compatibility issues. Possible solutions:")?;
        numbered(out, &recommendations)?;
    }
    Ok(())
}

fn render_schema(out: &mut impl Write, schema: &SchemaReport) -> io::Result<()> {
    writeln!(out, "  Tables: {:?}", schema.tables)?;
    let Some(collections) = &schema.collections else {
        return Ok(());
    };

    writeln!(out, "\n  Collections table structure:")?;
    for column in &collections.columns {
        writeln!(out, "    {} ({})", column.name, column.declared_type)?;
    }

    writeln!(
        out,
        "  Sample collection data ({} rows):",
        collections.sample.len()
    )?;
    for row in &collections.sample {
        writeln!(out, "    ID: {}, Name: {}", row.id, row.name)?;
        match &row.configuration {
            SampledConfiguration::Absent => {}
            SampledConfiguration::Parsed { value } => {
                let pretty =
                    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
                writeln!(out, "    Configuration: {}", pretty)?;
            }
            SampledConfiguration::Invalid { raw, error } => {
                writeln!(out, "    Configuration (invalid JSON): {}", raw)?;
                writeln!(out, "    JSON Error: {}", error)?;
            }
        }
    }
    Ok(())
}

fn render_standard_connection(out: &mut impl Write, report: &ConnectivityReport) -> io::Result<()> {
    for attempt in &report.attempts {
        match &attempt.result {
            AttemptResult::Succeeded { collections } => {
                writeln!(out, "✓ Successfully connected to database")?;
                writeln!(
                    out,
                    "✓ Successfully listed collections: {} found",
                    collections.len()
                )?;
                for collection in collections {
                    writeln!(out, "  - {} (id: {})", collection.name, collection.id)?;
                }
            }
            AttemptResult::Failed {
                stage,
                kind,
                message,
            } => {
                let what = match stage {
                    FailureStage::Connect => "connecting to database",
                    FailureStage::ListCollections => {
                        writeln!(out, "✓ Successfully connected to database")?;
                        "listing collections"
                    }
                };
                writeln!(out, "✗ Error {}: {}", what, message)?;
                writeln!(out, "  Error type: {}", kind)?;
            }
        }
    }
    Ok(())
}

fn render_attempts(out: &mut impl Write, report: &ConnectivityReport) -> io::Result<()> {
    for (i, attempt) in report.attempts.iter().enumerate() {
        writeln!(out, "  Trying configuration {}: {}", i + 1, attempt.settings)?;
        match &attempt.result {
            AttemptResult::Succeeded { collections } => {
                writeln!(out, "    ✓ Success with {} collections", collections.len())?;
                for collection in collections {
                    writeln!(out, "      - {}", collection.name)?;
                }
            }
            AttemptResult::Failed { kind, message, .. } => {
                writeln!(out, "    ✗ Failed: {}: {}", kind, message)?;
            }
        }
    }
    Ok(())
}

/// Print a `chroma-version-analysis` report.
pub fn render_analysis(
    out: &mut impl Write,
    report: &AnalysisReport,
    backend: &str,
) -> io::Result<()> {
    title(out, "ChromaDB Version Compatibility Analysis")?;
    writeln!(out, "Database: {}", report.database_path.display())?;
    if let Some(name) = &report.collection_filter {
        writeln!(out, "Collection: {}", name)?;
    }

    section(out, "ChromaDB Version Information")?;
    writeln!(out, "Client backend: {}", backend)?;
    match &report.version {
        Some(VersionCheck::Assessed(advice)) => {
            writeln!(out, "ChromaDB version: {}", advice.version)?;
            match advice.compatibility {
                VersionCompatibility::KnownIssues => writeln!(
                    out,
                    "⚠  WARNING: Version {} has known compatibility issues with '_type' configuration",
                    advice.version
                )?,
                VersionCompatibility::PossibleIssues => writeln!(
                    out,
                    "⚠  WARNING: This version may have '_type' configuration issues"
                )?,
                VersionCompatibility::Compatible => writeln!(
                    out,
                    "✓ This version should handle '_type' configuration correctly"
                )?,
                VersionCompatibility::Unknown => {
                    writeln!(out, "No known '_type' issues for this version")?
                }
            }
            if let Some(recommendation) = &advice.recommendation {
                writeln!(out, "   Recommended: {}", recommendation)?;
            }
        }
        Some(VersionCheck::Invalid { version, message }) => {
            writeln!(out, "✗ Could not parse client version {:?}: {}", version, message)?
        }
        None => writeln!(out, "ChromaDB version: unknown (pass --client-version)")?,
    }

    section(out, "Testing ChromaDB Connection Approaches")?;
    for attempt in &report.connectivity.attempts {
        writeln!(out, "\nTesting: {}", attempt.settings)?;
        match &attempt.result {
            AttemptResult::Succeeded { collections } => {
                writeln!(out, "  ✓ Success! Found {} collections", collections.len())?;
                for collection in collections {
                    writeln!(out, "    - {}", collection.name)?;
                }
            }
            AttemptResult::Failed { kind, message, .. } => {
                writeln!(out, "  ✗ Failed: {}: {}", kind, message)?;
            }
        }
    }

    if let Some(analysis) = &report.configuration {
        render_configuration(out, analysis)?;
    }

    let recommendations = report.recommendations();
    if !recommendations.is_empty() {
        section(out, "Recommendations")?;
        numbered(out, &recommendations)?;
    }
    Ok(())
}

fn render_configuration(out: &mut impl Write, analysis: &ConfigurationAnalysis) -> io::Result<()> {
    section(out, "Analyzing Configuration Error")?;
    let Some(storage_file) = &analysis.storage_file else {
        writeln!(out, "ERROR: Could not find ChromaDB SQLite file")?;
        return Ok(());
    };
    writeln!(out, "Analyzing SQLite database: {}", storage_file.display())?;
    if let Some(error) = &analysis.error {
        writeln!(out, "Error analyzing SQLite database: {}", error)?;
        return Ok(());
    }

    writeln!(out, "Found {} collections:", analysis.plans.len())?;
    for plan in &analysis.plans {
        writeln!(out, "\nCollection: {} (ID: {})", plan.name, plan.id)?;
        match &plan.status {
            ConfigurationStatus::Valid { variant } => {
                writeln!(out, "  ✓ Configuration has '_type': {}", variant)?
            }
            ConfigurationStatus::MissingDiscriminator => {
                writeln!(out, "  ✗ PROBLEM: Missing '_type' field in configuration")?;
                if let RepairBasis::InferredFromIndexBlock { index } = plan.basis {
                    writeln!(
                        out,
                        "  SUGGESTION: This appears to be an {} configuration",
                        index.as_str()
                    )?;
                }
            }
            ConfigurationStatus::MalformedJson { error } => {
                writeln!(out, "  ✗ PROBLEM: Invalid JSON in configuration: {}", error)?
            }
            ConfigurationStatus::Absent => {
                writeln!(out, "  ✗ PROBLEM: No configuration JSON found")?
            }
        }
    }

    match &analysis.script {
        None => writeln!(out, "\n✓ No configuration issues found!")?,
        Some(script) => {
            section(out, "Generating Migration Script")?;
            writeln!(
                out,
                "Migration script with {} statements written to: {}",
                script.statements,
                script.path.display()
            )?;
            writeln!(out, "\nTo apply the migration:")?;
            numbered(out, &script.apply_instructions)?;
        }
    }
    Ok(())
}
