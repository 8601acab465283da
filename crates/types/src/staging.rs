//! Staging result and staging info documents
//!
//! `StagingResult` is written as JSON to the result metadata location;
//! `StagingInfo` is written into the droplet as `./staging_info.yml`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mapping of process-type name to launch command.
///
/// A `BTreeMap` keeps serialized output deterministic.
pub type ProcessTypes = BTreeMap<String, String>;

/// The only lifecycle this runner implements.
pub const LIFECYCLE_TYPE: &str = "buildpack";

/// Result metadata handed back to the platform after staging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingResult {
    pub process_types: ProcessTypes,
    pub lifecycle_type: String,
    pub lifecycle_metadata: LifecycleMetadata,
    pub execution_metadata: String,
}

impl StagingResult {
    /// Assemble a result document for the buildpack lifecycle.
    #[must_use]
    pub fn new(process_types: ProcessTypes, lifecycle_metadata: LifecycleMetadata) -> Self {
        Self {
            process_types,
            lifecycle_type: LIFECYCLE_TYPE.to_string(),
            lifecycle_metadata,
            execution_metadata: String::new(),
        }
    }
}

/// Buildpack lifecycle section of the staging result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleMetadata {
    pub detected_buildpack: String,
    pub buildpack_key: String,
    pub buildpacks: Vec<BuildpackMetadata>,
}

/// One entry of the selected buildpack sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildpackMetadata {
    pub key: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Document embedded in the droplet as `./staging_info.yml`.
///
/// Written with a JSON encoder (JSON is a YAML subset), matching what
/// droplet consumers parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingInfo {
    pub detected_buildpack: String,
    pub start_command: String,
}
