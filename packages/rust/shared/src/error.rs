//! Error types for Blankforge.
//!
//! Library crates use [`BlankforgeError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Per-record problems (a malformed source document, an empty response)
//! are never surfaced as errors — stages skip and count them. Only
//! input/environment failures use this type.

use std::path::PathBuf;

/// Top-level error type for all Blankforge operations.
#[derive(Debug, thiserror::Error)]
pub enum BlankforgeError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// HTML or JSON parsing error for a source document.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error (missing content root, unwritable output).
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (missing fields, bad record shape).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// JSONL serialization error.
    #[error("format error: {0}")]
    Format(String),

    /// External fine-tuning job error (spawn, wait, cancel).
    #[error("training error: {0}")]
    Training(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BlankforgeError>;

impl BlankforgeError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
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
        let err = BlankforgeError::config("missing trainer command");
        assert_eq!(err.to_string(), "config error: missing trainer command");

        let err = BlankforgeError::validation("product record has no id");
        assert!(err.to_string().contains("no id"));
    }

    #[test]
    fn io_error_includes_path() {
        let err = BlankforgeError::io(
            "/tmp/missing",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.to_string().contains("/tmp/missing"));
    }
}
