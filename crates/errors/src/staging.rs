//! Staging pipeline error types
//!
//! Each variant maps to one of the stable exit codes of the buildpack
//! contract. The display strings are part of that contract too: external
//! tooling matches on them, so they must not drift.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum StagingError {
    #[error("None of the buildpacks detected a compatible application")]
    NoAppDetected,

    #[error("failed to compile droplet: {message}")]
    CompileFailed { message: String },

    #[error("no release script: {key}")]
    NoReleaseScript { key: String },

    #[error("Failed to build droplet release: {message}")]
    ReleaseFailed { message: String },

    #[error("buildpack's release output invalid: {message}")]
    ReleaseOutputInvalid { message: String },

    #[error("Error: one of the buildpacks chosen to supply dependencies does not support multi-buildpack apps")]
    SupplyScriptMissing { key: String },

    #[error("Failed to run all supply scripts: {message}")]
    SupplyFailed { message: String },

    #[error("Failed to read command from Procfile: {message}")]
    ProcfileInvalid { message: String },

    #[error("malformed buildpack does not contain a /bin dir: {key}")]
    MalformedBuildpack { key: String },
}

impl StagingError {
    /// The stable exit code for this error kind.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoAppDetected => 222,
            Self::CompileFailed { .. } => 223,
            Self::NoReleaseScript { .. }
            | Self::ReleaseFailed { .. }
            | Self::ReleaseOutputInvalid { .. } => 224,
            Self::SupplyScriptMissing { .. } | Self::SupplyFailed { .. } => 225,
            Self::ProcfileInvalid { .. } | Self::MalformedBuildpack { .. } => 1,
        }
    }
}
