//! Staging run configuration

use stager_errors::{ConfigError, Result};
use std::path::{Path, PathBuf};

/// Immutable configuration for one staging run
#[derive(Clone, Debug)]
pub struct Config {
    /// Application source directory (the buildpacks' build dir)
    pub build_dir: PathBuf,
    /// Directory holding the candidate buildpacks, one per hashed subdir
    pub buildpacks_dir: PathBuf,
    /// Where the droplet archive is written
    pub output_droplet: PathBuf,
    /// Where the build-artifacts cache archive is written
    pub output_build_artifacts_cache: PathBuf,
    /// Where the result metadata JSON is written
    pub output_metadata: PathBuf,
    /// Ordered candidate buildpack identifiers
    pub buildpack_order: Vec<String>,
    /// Cache directory handed to buildpack scripts as `<cache-dir>`
    pub build_artifacts_cache: PathBuf,
    /// Select the last candidate without running detect scripts
    pub skip_detect: bool,
}

impl Config {
    /// Check the configuration before a run.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when a required path is unset, the build
    /// directory does not exist, or the buildpack order is empty.
    pub fn validate(&self) -> Result<()> {
        require_path("build_dir", &self.build_dir)?;
        require_path("buildpacks_dir", &self.buildpacks_dir)?;
        require_path("output_droplet", &self.output_droplet)?;
        require_path(
            "output_build_artifacts_cache",
            &self.output_build_artifacts_cache,
        )?;
        require_path("output_metadata", &self.output_metadata)?;
        require_path("build_artifacts_cache", &self.build_artifacts_cache)?;

        if !self.build_dir.is_dir() {
            return Err(ConfigError::BuildDirMissing {
                path: self.build_dir.display().to_string(),
            }
            .into());
        }

        if self.buildpack_order.is_empty() {
            return Err(ConfigError::EmptyBuildpackOrder.into());
        }

        Ok(())
    }
}

fn require_path(field: &str, path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::MissingPath {
            field: field.to_string(),
        }
        .into());
    }
    Ok(())
}
