//! Append-only audit log writer.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use hotfolder_core::{ActionKind, ActionRecord, FileSystem};

use crate::error::{io_err, SyncError};

/// Appends one [`ActionRecord`] line per call.
///
/// The log file is opened in append/create mode for every record and closed
/// before returning; no handle outlives a call.
#[derive(Debug, Clone)]
pub struct ActionLogger {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
}

impl ActionLogger {
    pub fn new(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
        }
    }

    /// Append `action` on `file`, stamped now. Returns the record written.
    pub fn record(&self, action: ActionKind, file: &Path) -> Result<ActionRecord, SyncError> {
        let record = ActionRecord::now(action, file);
        let line = format!("{record}\n");
        self.fs
            .append(&self.path, line.as_bytes())
            .map_err(|e| io_err(&self.path, e))?;
        Ok(record)
    }
}
