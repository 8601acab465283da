//! Buildpack `manifest.yml` handling
//!
//! Buildpacks may ship a manifest with human-readable metadata. Only the
//! fields the staging result reports are read; the rest of the manifest
//! (dependency lists, stacks) belongs to the buildpack itself.

use serde::Deserialize;

/// Subset of `manifest.yml` the runner consumes
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildpackManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl BuildpackManifest {
    /// Parse a manifest from YAML text.
    ///
    /// # Errors
    ///
    /// Returns the underlying YAML error when the text cannot be parsed.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yml::Error> {
        let value: serde_yml::Value = serde_yml::from_str(text)?;
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_yml::from_value(value)
    }
}
