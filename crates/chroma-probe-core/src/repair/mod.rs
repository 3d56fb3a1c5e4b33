//! Configuration repair heuristic.
//!
//! Legacy Chroma databases store collection configurations without the `_type`
//! discriminator that newer clients require. The heuristic classifies every
//! stored blob and computes a corrected configuration for the ones that break
//! the invariant:
//!
//! - missing discriminator: the decoded object plus `_type`, nothing else changed
//! - malformed or absent: a fixed minimal default
//! - valid: left alone
//!
//! Everything here is pure; the storage file is never touched.

mod classify;

pub use classify::{
    classify_configuration, detect_index_kind, Classification, ConfigurationStatus, IndexKind,
};

use crate::config::RepairConfig;
use crate::error::Result;
use crate::storage::CollectionRecord;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Why a corrected configuration looks the way it does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "basis", rename_all = "snake_case")]
pub enum RepairBasis {
    AlreadyValid,
    /// Discriminator added because an index parameter block was found.
    InferredFromIndexBlock { index: IndexKind },
    /// Discriminator added with no index block to go on.
    AssumedDefault,
    /// Content discarded and replaced by [`default_configuration`].
    DefaultSubstituted,
}

/// Classification and correction for a single configuration blob.
#[derive(Debug, Clone, PartialEq)]
pub struct RepairOutcome {
    pub status: ConfigurationStatus,
    pub basis: RepairBasis,
    /// `None` only when the configuration is already valid.
    pub corrected: Option<Map<String, Value>>,
}

/// The configuration substituted for malformed or absent blobs.
pub fn default_configuration() -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(
        RepairConfig::DISCRIMINATOR_KEY.to_string(),
        Value::String(RepairConfig::INTERNAL_VARIANT.to_string()),
    );
    map.insert(RepairConfig::HNSW_KEY.to_string(), Value::Object(Map::new()));
    map.insert(
        RepairConfig::EMBEDDING_FUNCTION_KEY.to_string(),
        Value::Object(Map::new()),
    );
    map
}

/// Add the discriminator to `map` unless it already names a variant.
///
/// A non-string `_type` is overwritten in place.
pub fn ensure_discriminator(mut map: Map<String, Value>) -> Map<String, Value> {
    if !matches!(map.get(RepairConfig::DISCRIMINATOR_KEY), Some(Value::String(_))) {
        map.insert(
            RepairConfig::DISCRIMINATOR_KEY.to_string(),
            Value::String(RepairConfig::INTERNAL_VARIANT.to_string()),
        );
    }
    map
}

/// Classify a raw blob and compute its correction.
pub fn repair_configuration(raw: Option<&str>) -> RepairOutcome {
    let Classification { status, decoded } = classify_configuration(raw);

    if !status.needs_repair() {
        return RepairOutcome {
            status,
            basis: RepairBasis::AlreadyValid,
            corrected: None,
        };
    }

    match decoded {
        Some(map) if status == ConfigurationStatus::MissingDiscriminator => {
            let basis = match detect_index_kind(&map) {
                Some(index) => RepairBasis::InferredFromIndexBlock { index },
                None => RepairBasis::AssumedDefault,
            };
            RepairOutcome {
                status,
                basis,
                corrected: Some(ensure_discriminator(map)),
            }
        }
        _ => RepairOutcome {
            status,
            basis: RepairBasis::DefaultSubstituted,
            corrected: Some(default_configuration()),
        },
    }
}

/// Repair decision for one collection record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepairPlan {
    pub id: String,
    pub name: String,
    pub status: ConfigurationStatus,
    pub basis: RepairBasis,
    pub corrected: Option<Map<String, Value>>,
}

impl RepairPlan {
    pub fn needs_repair(&self) -> bool {
        self.corrected.is_some()
    }

    /// Compact JSON of the corrected configuration.
    pub fn corrected_json(&self) -> Result<Option<String>> {
        self.corrected
            .as_ref()
            .map(|map| serde_json::to_string(map).map_err(Into::into))
            .transpose()
    }
}

/// Plan repairs for every record, in input order.
pub fn plan_repairs(records: &[CollectionRecord]) -> Vec<RepairPlan> {
    records
        .iter()
        .map(|record| {
            let outcome = repair_configuration(record.configuration_json.as_deref());
            debug!(
                "Collection {} ({}): {}",
                record.name,
                record.id,
                outcome.status.label()
            );
            RepairPlan {
                id: record.id.clone(),
                name: record.name.clone(),
                status: outcome.status,
                basis: outcome.basis,
                corrected: outcome.corrected,
            }
        })
        .collect()
}

/// Plans that carry a corrected configuration.
pub fn corrections(plans: &[RepairPlan]) -> impl Iterator<Item = &RepairPlan> {
    plans.iter().filter(|plan| plan.needs_repair())
}

/// Per-status counts over a set of plans.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairSummary {
    pub total: usize,
    pub valid: usize,
    pub missing_discriminator: usize,
    pub malformed: usize,
    pub absent: usize,
}

impl RepairSummary {
    pub fn from_plans(plans: &[RepairPlan]) -> Self {
        let mut summary = RepairSummary {
            total: plans.len(),
            ..Default::default()
        };
        for plan in plans {
            match plan.status {
                ConfigurationStatus::Valid { .. } => summary.valid += 1,
                ConfigurationStatus::MissingDiscriminator => summary.missing_discriminator += 1,
                ConfigurationStatus::MalformedJson { .. } => summary.malformed += 1,
                ConfigurationStatus::Absent => summary.absent += 1,
            }
        }
        summary
    }

    pub fn problems(&self) -> usize {
        self.total - self.valid
    }
}
