//! Error types for newsrelay.
//!
//! Library crates use [`NewsRelayError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

use crate::types::LifecycleState;

/// Top-level error type for all newsrelay operations.
#[derive(Debug, thiserror::Error)]
pub enum NewsRelayError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while fetching feeds, pages, or media.
    #[error("network error: {0}")]
    Network(String),

    /// Feed, HTML, or response parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Record store is unreadable or malformed.
    #[error("store error: {0}")]
    Store(String),

    /// The store file was rewritten by someone else since it was loaded.
    #[error("store conflict: loaded revision {expected}, found revision {found} on disk")]
    StoreConflict { expected: u64, found: u64 },

    /// A lifecycle transition was refused.
    #[error("cannot move record from {from} to {to}: {reason}")]
    Transition {
        from: LifecycleState,
        to: LifecycleState,
        reason: String,
    },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad input, malformed URL, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, NewsRelayError>;

impl NewsRelayError {
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
