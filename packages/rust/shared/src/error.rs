//! Error types for the AI tool tracker.
//!
//! Library crates use [`TrackerError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all tracker operations.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while talking to a source or the summarizer.
    #[error("network error: {0}")]
    Network(String),

    /// HTML or JSON parsing error for a source response.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// A whole source could not deliver a batch this run.
    #[error("source {tag} unavailable: {reason}")]
    SourceUnavailable { tag: String, reason: String },

    /// A single candidate record is unusable after normalization.
    #[error("invalid record: {message}")]
    RecordInvalid { message: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Remote summarization backend error.
    #[error("enrichment error: {0}")]
    Enrichment(String),

    /// The scan could not start at all.
    #[error("orchestration error: {message}")]
    Orchestration { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (unknown tag, invalid format, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TrackerError>;

impl TrackerError {
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

    /// Create a record-level error for a candidate that cannot be kept.
    pub fn record_invalid(msg: impl Into<String>) -> Self {
        Self::RecordInvalid {
            message: msg.into(),
        }
    }

    /// Create a fatal orchestration error.
    pub fn orchestration(msg: impl Into<String>) -> Self {
        Self::Orchestration {
            message: msg.into(),
        }
    }

    /// Mark a source as unavailable for this run.
    pub fn source_unavailable(tag: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            tag: tag.into(),
            reason: reason.into(),
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
