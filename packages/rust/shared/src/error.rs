//! Error types for Wallabook.
//!
//! Library crates use [`WallabookError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Wallabook operations.
///
/// Every variant is terminal for an export run. Entries that are too short
/// to export are not errors; see `wallabook_core::filter::Decision`.
#[derive(Debug, thiserror::Error)]
pub enum WallabookError {
    /// Configuration resource missing, unreadable, malformed or incomplete.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network, authentication or remote failure while talking to wallabag.
    #[error("store query error: {0}")]
    StoreQuery(String),

    /// Serialization or filesystem failure while persisting the book.
    #[error("write error at {path:?}: {message}")]
    Write { path: PathBuf, message: String },

    /// Filesystem I/O error outside the export path.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, WallabookError>;

impl WallabookError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a store query error from any displayable message.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::StoreQuery(msg.into())
    }

    /// Create a write error for the given target path.
    pub fn write(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Write {
            path: path.into(),
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
