//! hotfolder core library: domain types, configuration, filesystem capability.
//!
//! Public API surface:
//! - [`types`]: filesystem events, audit actions and records
//! - [`config`]: [`MonitorConfig`]
//! - [`fs`]: the [`FileSystem`] capability with [`OsFs`] and [`MemFs`]
//! - [`error`]: [`CoreError`]
//!
//! # Single-writer precondition
//!
//! The hot directory, backup directory, tracking-state file and audit log are
//! assumed to be written by exactly one `hotfolder` process. Nothing here
//! takes locks; running two monitors against the same folders is unsupported.

pub mod config;
pub mod error;
pub mod fs;
pub mod types;

pub use config::MonitorConfig;
pub use error::CoreError;
pub use fs::{FileSystem, MemFs, OsFs};
pub use types::{
    has_delete_prefix, strip_delete_prefix, ActionKind, ActionRecord, FsEvent, FsOp,
    BACKUP_SUFFIX, DELETE_PREFIX,
};
