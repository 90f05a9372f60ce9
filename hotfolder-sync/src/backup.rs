//! Backup store: `.bak` mirror copies of hot-directory files.
//!
//! Backups live flat in the backup directory, keyed by base name:
//! `<hot>/a/report.txt` and `<hot>/b/report.txt` share `report.txt.bak`.
//!
//! Delete requests resolve their targets from the hot directory, never from
//! the raw event path:
//!
//! ```text
//! event      <anything>/delete_report.txt
//! target     <hot>/report.txt
//! sentinel   <hot>/delete_report.txt
//! backup     <backup>/report.txt.bak
//! ```

use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hotfolder_core::{strip_delete_prefix, FileSystem, MonitorConfig};

use crate::error::{io_err, SyncError};

/// Outcome of a delete request. Each target is attempted independently.
#[derive(Debug, Default)]
pub struct DeleteReport {
    /// Paths that existed and were removed, in removal order.
    pub removed: Vec<PathBuf>,
    /// One error per target whose removal failed.
    pub failures: Vec<SyncError>,
}

impl DeleteReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Writes and removes backup copies.
#[derive(Debug, Clone)]
pub struct BackupStore {
    fs: Arc<dyn FileSystem>,
    config: MonitorConfig,
}

impl BackupStore {
    pub fn new(fs: Arc<dyn FileSystem>, config: MonitorConfig) -> Self {
        Self { fs, config }
    }

    /// Backup slot for `path`: `<backup>/<base>.bak`.
    pub fn backup_path(&self, path: &Path) -> Result<PathBuf, SyncError> {
        Ok(self.config.backup_path(base_name(path)?))
    }

    /// Copy `path` to its backup slot, overwriting any previous backup.
    ///
    /// Returns the backup path written.
    pub fn backup(&self, path: &Path) -> Result<PathBuf, SyncError> {
        let dest = self.backup_path(path)?;
        let contents = self.fs.read(path).map_err(|e| io_err(path, e))?;
        self.fs
            .write(&dest, &contents)
            .map_err(|e| io_err(&dest, e))?;
        Ok(dest)
    }

    /// Carry out a `delete_` request for `path`.
    ///
    /// Removes, in order, the unprefixed hot-directory file, the sentinel
    /// itself, and the unprefixed backup. Missing targets are skipped. A bare
    /// `delete_` name has no unprefixed target, so only the sentinel goes.
    pub fn delete(&self, path: &Path) -> Result<DeleteReport, SyncError> {
        let name = base_name(path)?;
        let stripped = strip_delete_prefix(name);

        let mut targets = Vec::with_capacity(3);
        if !stripped.is_empty() {
            targets.push(self.config.hot_path(stripped));
        }
        targets.push(self.config.hot_path(name));
        if !stripped.is_empty() {
            targets.push(self.config.backup_path_for_request(name));
        }
        targets.dedup();

        let mut report = DeleteReport::default();
        for target in targets {
            match self.remove_if_exists(&target) {
                Ok(true) => report.removed.push(target),
                Ok(false) => {}
                Err(err) => report.failures.push(err),
            }
        }
        Ok(report)
    }

    /// Drop the backup of a file that was renamed away.
    ///
    /// Returns the removed backup path, or `None` if there was no backup. No
    /// backup is created for the new name; its own create event does that.
    pub fn rename_cleanup(&self, path: &Path) -> Result<Option<PathBuf>, SyncError> {
        let backup = self.backup_path(path)?;
        Ok(self.remove_if_exists(&backup)?.then_some(backup))
    }

    /// Remove `path` if it exists right now.
    ///
    /// A file that vanishes between the check and the removal surfaces as an
    /// error; the caller logs it.
    fn remove_if_exists(&self, path: &Path) -> Result<bool, SyncError> {
        match self.fs.exists(path) {
            Ok(true) => {}
            Ok(false) => return Ok(false),
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(false),
            Err(err) => return Err(io_err(path, err)),
        }
        self.fs.remove(path).map_err(|e| io_err(path, e))?;
        Ok(true)
    }
}

fn base_name(path: &Path) -> Result<&OsStr, SyncError> {
    path.file_name()
        .ok_or_else(|| SyncError::FileNameMissing(path.to_path_buf()))
}
