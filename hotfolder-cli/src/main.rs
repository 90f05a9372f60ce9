//! hotfolder: mirror a hot folder into backups and audit every change.
//!
//! # Usage
//!
//! ```text
//! hotfolder monitor [--hot-dir ./hot] [--backup-dir ./backup] [--log-file F] [--state-file F]
//! hotfolder logs [--log-file F] [--lines N]
//! hotfolder logs-filter <PATTERN> [--log-file F]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    logs::{LogsArgs, LogsFilterArgs},
    monitor::MonitorArgs,
};

#[derive(Parser, Debug)]
#[command(
    name = "hotfolder",
    version,
    about = "Watch a hot folder, keep .bak mirrors, and log every action",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start monitoring the hot folder (runs until Ctrl-C).
    Monitor(MonitorArgs),

    /// Print the audit log.
    Logs(LogsArgs),

    /// Print audit log lines matching a regular expression (date, action, file name, ...).
    LogsFilter(LogsFilterArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Monitor(args) => args.run(),
        Commands::Logs(args) => args.run(),
        Commands::LogsFilter(args) => args.run(),
    }
}
