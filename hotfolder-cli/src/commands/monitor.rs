//! `hotfolder monitor`: run the watcher in the foreground.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use hotfolder_core::config::{
    DEFAULT_BACKUP_DIR, DEFAULT_HOT_DIR, DEFAULT_LOG_FILE, DEFAULT_STATE_FILE,
};
use hotfolder_core::MonitorConfig;

/// Arguments for `hotfolder monitor`.
#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Directory to watch.
    #[arg(long, default_value = DEFAULT_HOT_DIR)]
    pub hot_dir: PathBuf,

    /// Directory that receives `<name>.bak` copies.
    #[arg(long, default_value = DEFAULT_BACKUP_DIR)]
    pub backup_dir: PathBuf,

    /// Append-only audit log.
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Tracking state persisted across restarts.
    #[arg(long, default_value = DEFAULT_STATE_FILE)]
    pub state_file: PathBuf,
}

impl From<MonitorArgs> for MonitorConfig {
    fn from(args: MonitorArgs) -> Self {
        Self {
            hot_dir: args.hot_dir,
            backup_dir: args.backup_dir,
            log_file: args.log_file,
            state_file: args.state_file,
        }
    }
}

impl MonitorArgs {
    pub fn run(self) -> Result<()> {
        let config = MonitorConfig::from(self);
        let hot_dir = config.hot_dir.clone();
        hotfolder_daemon::start_blocking(config)
            .with_context(|| format!("monitoring {} failed", hot_dir.display()))
    }
}
