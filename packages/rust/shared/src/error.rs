//! Error types for CourseHub.
//!
//! Library crates use [`CourseHubError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all CourseHub operations.
#[derive(Debug, thiserror::Error)]
pub enum CourseHubError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Malformed YAML (syntax or type mismatch) in a content file.
    #[error("parse error in {path:?}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A required field is absent from a content record.
    #[error("missing field in {path:?}: {field}")]
    MissingField { path: PathBuf, field: String },

    /// Network/HTTP error during link checking or monitoring.
    #[error("network error: {0}")]
    Network(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Content validation error (duplicate id, bad URL, step order, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Static export failure.
    #[error("export error: {0}")]
    Export(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CourseHubError>;

impl CourseHubError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error for a content file.
    pub fn parse(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create a missing-field error for a content file.
    pub fn missing_field(path: impl Into<PathBuf>, field: impl Into<String>) -> Self {
        Self::MissingField {
            path: path.into(),
            field: field.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Classify a `serde_yaml` failure as a missing field or a malformed file.
    pub fn from_yaml(path: impl Into<PathBuf>, err: &serde_yaml::Error) -> Self {
        let message = err.to_string();
        match missing_field_name(&message) {
            Some(field) => Self::missing_field(path, field),
            None => Self::parse(path, message),
        }
    }
}

/// Extract `title` from serde's "missing field `title`" message.
fn missing_field_name(message: &str) -> Option<String> {
    let rest = message.split("missing field `").nth(1)?;
    let end = rest.find('`')?;
    Some(rest[..end].to_string())
}
