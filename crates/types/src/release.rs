//! The document a buildpack's `release` script prints on stdout

use crate::staging::ProcessTypes;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Parsed `release` output.
///
/// Only two fields are recognized; anything else a buildpack prints is
/// ignored. `config_vars` is carried for parse validation but unused by
/// the staging core.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildpackRelease {
    #[serde(default)]
    pub default_process_types: ProcessTypes,
    #[serde(default)]
    pub config_vars: BTreeMap<String, String>,
}

impl BuildpackRelease {
    /// Parse release output from YAML text.
    ///
    /// An empty document (some buildpacks print a bare `---`) is treated
    /// as a release with no process types.
    ///
    /// # Errors
    ///
    /// Returns the underlying YAML error when the text cannot be parsed
    /// or does not have the expected shape.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yml::Error> {
        let value: serde_yml::Value = serde_yml::from_str(text)?;
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_yml::from_value(value)
    }
}
