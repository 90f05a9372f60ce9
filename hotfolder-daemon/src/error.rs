use std::path::PathBuf;

use thiserror::Error;

/// Error surface for the monitor runtime. Every variant is fatal to the run.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),

    #[error("{task} task join failure: {source}")]
    Join {
        task: &'static str,
        #[source]
        source: tokio::task::JoinError,
    },

    #[error("signal handler failed: {0}")]
    Signal(std::io::Error),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        path: path.into(),
        source,
    }
}
