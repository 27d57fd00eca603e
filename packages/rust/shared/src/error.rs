//! Error types for progscout.
//!
//! Library crates use [`ProgScoutError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all progscout operations.
#[derive(Debug, thiserror::Error)]
pub enum ProgScoutError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while fetching a page or downloading a document.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Artifact store consistency error (malformed persisted data).
    #[error("store error: {0}")]
    Store(String),

    /// Data validation error (bad program key, malformed input).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ProgScoutError>;

impl ProgScoutError {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = ProgScoutError::config("missing data_dir");
        assert_eq!(err.to_string(), "config error: missing data_dir");

        let err = ProgScoutError::validation("unknown program key 'robotics'");
        assert!(err.to_string().contains("robotics"));

        let err = ProgScoutError::Fetch("HTTP 503 at https://example.com".into());
        assert!(err.to_string().starts_with("fetch error:"));
    }
}
