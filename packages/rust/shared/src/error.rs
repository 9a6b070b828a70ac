//! Error types for healthpull.
//!
//! Library crates use [`HealthPullError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all healthpull operations.
///
/// Every stage fails fast: a single error aborts the whole run. There is
/// no retry or partial-result recovery anywhere in the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum HealthPullError {
    /// Bad or unknown configuration: unrecognized country or level name,
    /// malformed period string, missing connection or secret.
    #[error("config error: {message}")]
    Config { message: String },

    /// Credential exchange with the remote token endpoint failed.
    #[error("auth error: {0}")]
    Auth(String),

    /// Non-success HTTP status or malformed response body during extraction.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Data validation error (missing response field, schema mismatch).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, HealthPullError>;

impl HealthPullError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
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
}
