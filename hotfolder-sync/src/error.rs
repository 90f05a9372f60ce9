//! Error types for hotfolder-sync.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from backup, tracking, and audit operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error (tracking state).
    #[error("tracking state JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The audit filter pattern is not a valid regular expression.
    #[error("invalid filter pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// The event path has no UTF-8 base name to act on.
    #[error("cannot determine file name for path: {0:?}")]
    FileNameMissing(PathBuf),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
