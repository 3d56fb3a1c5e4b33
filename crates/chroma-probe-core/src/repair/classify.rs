//! Classification of stored collection configurations.

use crate::config::RepairConfig;
use serde::Serialize;
use serde_json::{Map, Value};

/// How a stored configuration blob relates to the `_type` invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConfigurationStatus {
    /// Decodes to an object carrying the discriminator.
    Valid { variant: String },
    /// Decodes to an object without the discriminator.
    MissingDiscriminator,
    /// Does not decode, or decodes to something other than an object.
    MalformedJson { error: String },
    /// NULL or empty.
    Absent,
}

impl ConfigurationStatus {
    pub fn needs_repair(&self) -> bool {
        !matches!(self, ConfigurationStatus::Valid { .. })
    }

    /// Short human label.
    pub fn label(&self) -> &'static str {
        match self {
            ConfigurationStatus::Valid { .. } => "valid",
            ConfigurationStatus::MissingDiscriminator => "missing '_type' field",
            ConfigurationStatus::MalformedJson { .. } => "invalid JSON",
            ConfigurationStatus::Absent => "no configuration JSON",
        }
    }
}

/// Index families recognised by their parameter block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    Hnsw,
    Spann,
}

impl IndexKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexKind::Hnsw => "HNSW",
            IndexKind::Spann => "SPANN",
        }
    }
}

/// Result of classifying one blob, with the decoded object when there is one.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub status: ConfigurationStatus,
    pub decoded: Option<Map<String, Value>>,
}

/// Classify a raw `configuration_json_str` value.
///
/// A string `_type` counts as `Valid` whatever variant it names. Only
/// `CollectionConfigurationInternal` is written by repairs, and rewriting an
/// unrecognised variant could discard parameters that belong to it, so such
/// rows are left for the client to reject. A `_type` that is not a string
/// names no variant and is treated as missing.
pub fn classify_configuration(raw: Option<&str>) -> Classification {
    let raw = match raw {
        None | Some("") => {
            return Classification {
                status: ConfigurationStatus::Absent,
                decoded: None,
            }
        }
        Some(raw) => raw,
    };

    let map = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            return Classification {
                status: ConfigurationStatus::MalformedJson {
                    error: format!("expected a JSON object, found {}", json_kind(&other)),
                },
                decoded: None,
            }
        }
        Err(e) => {
            return Classification {
                status: ConfigurationStatus::MalformedJson {
                    error: e.to_string(),
                },
                decoded: None,
            }
        }
    };

    let status = match map.get(RepairConfig::DISCRIMINATOR_KEY) {
        Some(Value::String(variant)) => ConfigurationStatus::Valid {
            variant: variant.clone(),
        },
        Some(_) | None => ConfigurationStatus::MissingDiscriminator,
    };

    Classification {
        status,
        decoded: Some(map),
    }
}

/// The index family whose parameter block appears in `map`, if any.
pub fn detect_index_kind(map: &Map<String, Value>) -> Option<IndexKind> {
    if map.contains_key(RepairConfig::HNSW_KEY) {
        Some(IndexKind::Hnsw)
    } else if map.contains_key(RepairConfig::SPANN_KEY) {
        Some(IndexKind::Spann)
    } else {
        None
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
