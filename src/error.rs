//! Structured error types for configuration loading.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Configuration errors, reported before any I/O
    InvalidSource,
    DuplicateSource,
    EmptyOrder,
    Manifest,

    // Source errors
    Io,
    Parse,
    SecretStore,
    NoConfigFiles,
}

/// Errors raised while resolving or merging configuration sources.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid merge source '{value}'. Valid sources: {valid}")]
    InvalidSource { value: String, valid: String },

    #[error("merge source '{0}' listed more than once")]
    DuplicateSource(String),

    #[error("merge order must name at least one source")]
    EmptyOrder,

    #[error("cannot resolve package name from {}: {reason}", path.display())]
    Manifest { path: PathBuf, reason: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to fetch secret '{secret}': {reason}")]
    SecretStore { secret: String, reason: String },

    #[error("missing configuration file in {} for \"{env}\" env", dir.display())]
    NoConfigFiles { dir: PathBuf, env: String },
}

impl ConfigError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidSource { .. } => ErrorCode::InvalidSource,
            Self::DuplicateSource(_) => ErrorCode::DuplicateSource,
            Self::EmptyOrder => ErrorCode::EmptyOrder,
            Self::Manifest { .. } => ErrorCode::Manifest,
            Self::Io { .. } => ErrorCode::Io,
            Self::Parse { .. } => ErrorCode::Parse,
            Self::SecretStore { .. } => ErrorCode::SecretStore,
            Self::NoConfigFiles { .. } => ErrorCode::NoConfigFiles,
        }
    }

    /// True for errors caused by how the merge was requested rather than by
    /// the sources themselves.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidSource { .. }
                | Self::DuplicateSource(_)
                | Self::EmptyOrder
                | Self::Manifest { .. }
        )
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }

    pub fn secret_store(secret: &str, reason: impl std::fmt::Display) -> Self {
        Self::SecretStore {
            secret: secret.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Serializable error report used by JSON CLI output.
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    pub message: String,
}

impl ErrorReport {
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        Self {
            status: "error",
            code: err.downcast_ref::<ConfigError>().map(ConfigError::code),
            message: err.to_string(),
        }
    }
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
