//! Buildpack resolution and script lookup
//!
//! A buildpack identifier maps to a directory whose name is the lowercase
//! hex MD5 of the identifier bytes. Extraction tooling sometimes leaves
//! the real buildpack nested one level deeper; resolution descends into a
//! single wrapper directory when the top level has no `bin/`.

use stager_errors::StagingError;
use stager_types::BuildpackManifest;
use std::path::{Path, PathBuf};

/// Scripts a buildpack may provide under `bin/`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Detect,
    Supply,
    Finalize,
    Compile,
    Release,
}

impl Script {
    /// File name of this script inside the buildpack's `bin/`
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Detect => "detect",
            Self::Supply => "supply",
            Self::Finalize => "finalize",
            Self::Compile => "compile",
            Self::Release => "release",
        }
    }

    /// Whether the runner parses this script's stdout.
    ///
    /// Capture-mode scripts cannot fall back to a shell when the file is
    /// not executable: detect skips to the next candidate and release is
    /// required to be runnable as-is.
    pub(crate) fn captures_output(self) -> bool {
        matches!(self, Self::Detect | Self::Release)
    }
}

/// Directory name for a buildpack identifier
#[must_use]
pub fn buildpack_dir_name(key: &str) -> String {
    format!("{:x}", md5::compute(key.as_bytes()))
}

/// A buildpack identifier resolved to its on-disk directory
#[derive(Debug, Clone)]
pub struct Buildpack {
    pub key: String,
    dir: PathBuf,
}

impl Buildpack {
    /// Resolve an identifier inside the buildpacks directory.
    ///
    /// # Errors
    ///
    /// Returns `MalformedBuildpack` when no `bin/` directory can be found,
    /// neither at the top level nor nested one level under a single
    /// wrapper directory.
    pub fn resolve(buildpacks_dir: &Path, key: &str) -> Result<Self, StagingError> {
        let mut dir = buildpacks_dir.join(buildpack_dir_name(key));
        if !dir.join("bin").is_dir() {
            match single_subdirectory(&dir) {
                Some(nested) if nested.join("bin").is_dir() => dir = nested,
                _ => {
                    return Err(StagingError::MalformedBuildpack {
                        key: key.to_string(),
                    });
                }
            }
        }
        Ok(Self {
            key: key.to_string(),
            dir,
        })
    }

    /// The resolved buildpack directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Absolute path of one of the buildpack's scripts
    #[must_use]
    pub fn script_path(&self, script: Script) -> PathBuf {
        self.dir.join("bin").join(script.name())
    }

    /// Whether the buildpack ships the given script
    #[must_use]
    pub fn has_script(&self, script: Script) -> bool {
        self.script_path(script).is_file()
    }

    /// Load `manifest.yml` when present and parseable.
    pub async fn manifest(&self) -> Option<BuildpackManifest> {
        let text = tokio::fs::read_to_string(self.dir.join("manifest.yml"))
            .await
            .ok()?;
        BuildpackManifest::from_yaml(&text).ok()
    }
}

fn single_subdirectory(dir: &Path) -> Option<PathBuf> {
    let mut entries = std::fs::read_dir(dir).ok()?;
    let first = entries.next()?.ok()?;
    if entries.next().is_some() {
        return None;
    }
    let path = first.path();
    path.is_dir().then_some(path)
}
