//! `hotfolder logs` and `hotfolder logs-filter`: read the audit log.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use hotfolder_core::config::DEFAULT_LOG_FILE;
use hotfolder_core::OsFs;
use hotfolder_sync::audit;

/// Arguments for `hotfolder logs`.
#[derive(Args, Debug)]
pub struct LogsArgs {
    /// Audit log to read.
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Only show the last N lines.
    #[arg(long)]
    pub lines: Option<usize>,
}

impl LogsArgs {
    pub fn run(self) -> Result<()> {
        let text = audit::read_log(&OsFs, &self.log_file)
            .with_context(|| format!("failed to read {}", self.log_file.display()))?;

        match self.lines {
            Some(n) => {
                for line in audit::tail(&text, n) {
                    println!("{line}");
                }
            }
            None => print!("{text}"),
        }
        Ok(())
    }
}

/// Arguments for `hotfolder logs-filter`.
#[derive(Args, Debug)]
pub struct LogsFilterArgs {
    /// Regular expression matched against each log line.
    pub pattern: String,

    /// Audit log to read.
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,
}

impl LogsFilterArgs {
    pub fn run(self) -> Result<()> {
        let lines = audit::filter_log(&OsFs, &self.log_file, &self.pattern)
            .with_context(|| format!("cannot filter logs with '{}'", self.pattern))?;

        for line in lines {
            println!("{line}");
        }
        Ok(())
    }
}
