//! Configuration error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("missing required path: {field}")]
    MissingPath { field: String },

    #[error("build directory does not exist: {path}")]
    BuildDirMissing { path: String },

    #[error("buildpack order is empty")]
    EmptyBuildpackOrder,
}
