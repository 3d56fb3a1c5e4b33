//! Client version advisory.
//!
//! Some Chroma client releases cannot read configurations written by others.
//! This maps a client version onto what is known about its `_type` handling.

use crate::config::VersionConfig;
use crate::error::{ProbeError, Result};
use semver::Version;
use serde::Serialize;

/// Known compatibility of a client release with stored `_type` configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionCompatibility {
    /// Release line with known `_type` problems.
    KnownIssues,
    /// Early 1.0 release that may mishandle `_type`.
    PossibleIssues,
    /// Reads `_type` configurations correctly.
    Compatible,
    /// Outside every known range.
    Unknown,
}

#[derive(Debug, Clone, Serialize)]
pub struct VersionAdvice {
    pub version: String,
    pub compatibility: VersionCompatibility,
    pub recommendation: Option<String>,
}

/// Parse a client version, tolerating a leading `v` and missing components.
fn parse_version(raw: &str) -> Result<Version> {
    let trimmed = raw.trim().trim_start_matches('v');
    let padded = match trimmed.split('.').count() {
        1 => format!("{}.0.0", trimmed),
        2 => format!("{}.0", trimmed),
        _ => trimmed.to_string(),
    };
    Version::parse(&padded).map_err(|e| ProbeError::Version {
        version: raw.to_string(),
        message: e.to_string(),
    })
}

/// Assess a client version string.
pub fn assess_client_version(raw: &str) -> Result<VersionAdvice> {
    let version = parse_version(raw)?;
    // Pre-release tags are ignored; 1.0.7-rc1 behaves like 1.0.7 for this purpose
    let release = Version::new(version.major, version.minor, version.patch);
    let fixed = Version::parse(VersionConfig::FIXED_RELEASE).map_err(|e| ProbeError::Version {
        version: VersionConfig::FIXED_RELEASE.to_string(),
        message: e.to_string(),
    })?;

    let (compatibility, recommendation) =
        if (release.major, release.minor) == VersionConfig::BROKEN_MINOR {
            (
                VersionCompatibility::KnownIssues,
                Some(format!(
                    "Upgrade to version {}+ or downgrade to {}",
                    VersionConfig::FIXED_RELEASE,
                    VersionConfig::STABLE_FALLBACK
                )),
            )
        } else if release.major == fixed.major && release.minor == fixed.minor && release < fixed {
            (
                VersionCompatibility::PossibleIssues,
                Some(format!("Upgrade to version {}+", VersionConfig::FIXED_RELEASE)),
            )
        } else if release >= fixed {
            (VersionCompatibility::Compatible, None)
        } else {
            (VersionCompatibility::Unknown, None)
        };

    Ok(VersionAdvice {
        version: raw.trim().to_string(),
        compatibility,
        recommendation,
    })
}
