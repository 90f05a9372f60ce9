//! Monitor configuration.
//!
//! Built once at startup (CLI flags over [`Default`]) and handed to every
//! component; nothing reads paths from process-wide state.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::types::{strip_delete_prefix, BACKUP_SUFFIX};

pub const DEFAULT_HOT_DIR: &str = "./hot";
pub const DEFAULT_BACKUP_DIR: &str = "./backup";
pub const DEFAULT_LOG_FILE: &str = "hotfolder.log";
pub const DEFAULT_STATE_FILE: &str = "hotfolder.state.json";

/// Folder and file locations used by a monitor run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Watched source directory.
    pub hot_dir: PathBuf,
    /// Destination of `.bak` mirror copies.
    pub backup_dir: PathBuf,
    /// Append-only audit log.
    pub log_file: PathBuf,
    /// Persisted tracking state (JSON).
    pub state_file: PathBuf,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            hot_dir: PathBuf::from(DEFAULT_HOT_DIR),
            backup_dir: PathBuf::from(DEFAULT_BACKUP_DIR),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
        }
    }
}

impl MonitorConfig {
    /// Lay out every location under `root` with the default names.
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            hot_dir: root.join("hot"),
            backup_dir: root.join("backup"),
            log_file: root.join(DEFAULT_LOG_FILE),
            state_file: root.join(DEFAULT_STATE_FILE),
        }
    }

    /// `<hot_dir>/<name>`. Pure, no I/O.
    pub fn hot_path(&self, name: impl AsRef<OsStr>) -> PathBuf {
        self.hot_dir.join(name.as_ref())
    }

    /// `<backup_dir>/<name>.bak`. Pure, no I/O.
    pub fn backup_path(&self, name: impl AsRef<OsStr>) -> PathBuf {
        let mut file = name.as_ref().to_os_string();
        file.push(BACKUP_SUFFIX);
        self.backup_dir.join(file)
    }

    /// Backup slot for a `delete_` request: the prefix is stripped first.
    pub fn backup_path_for_request(&self, name: impl AsRef<OsStr>) -> PathBuf {
        self.backup_path(strip_delete_prefix(&name))
    }
}
