#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Error types for the stager staging runner
//!
//! This crate provides fine-grained error types organized by domain.
//! Staging errors carry the stable exit codes external tooling relies on.

use thiserror::Error;

pub mod config;
pub mod staging;

// Re-export all error types at the root
pub use config::ConfigError;
pub use staging::StagingError;

/// Generic error type for cross-crate boundaries
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("staging error: {0}")]
    Staging(#[from] StagingError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("I/O error: {message}")]
    Io {
        kind: std::io::ErrorKind,
        message: String,
        path: Option<std::path::PathBuf>,
    },
}

impl Error {
    /// Create an internal error with a message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create an Io error with an associated path
    pub fn io_with_path(err: &std::io::Error, path: impl Into<std::path::PathBuf>) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: Some(path.into()),
        }
    }

    /// The process exit code this error maps to.
    ///
    /// Staging errors carry the stable codes of the buildpack contract;
    /// everything else is a generic failure.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Staging(err) => err.exit_code(),
            _ => 1,
        }
    }

    /// The user-facing message for this error.
    ///
    /// Staging errors surface verbatim; wrapper context is stripped so the
    /// messages external tooling matches on stay stable.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Staging(err) => err.to_string(),
            Self::Config(err) => err.to_string(),
            Self::Io { message, .. } => message.clone(),
            Self::Internal(message) => message.clone(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON error: {err}"))
    }
}

/// Result type alias for stager operations
pub type Result<T> = std::result::Result<T, Error>;
