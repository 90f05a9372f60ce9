//! Domain types for the hot-folder monitor.
//!
//! Paths and base names stay `PathBuf` / `OsStr` end to end, so file names
//! that are not valid UTF-8 are classified like any other.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{Local, NaiveDateTime};

use crate::error::CoreError;

/// File-name prefix that turns a create/write into a deletion request.
pub const DELETE_PREFIX: &str = "delete_";

/// Suffix appended to a base name to form its backup slot.
pub const BACKUP_SUFFIX: &str = ".bak";

/// Timestamp layout of audit records (local time, whole seconds).
pub const RECORD_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ---------------------------------------------------------------------------
// Filesystem events
// ---------------------------------------------------------------------------

/// Operation kind of a filesystem notification, after translation from the
/// notification backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FsOp {
    Create,
    Write,
    Remove,
    Rename,
}

impl fmt::Display for FsOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FsOp::Create => "create",
            FsOp::Write => "write",
            FsOp::Remove => "remove",
            FsOp::Rename => "rename",
        };
        f.write_str(s)
    }
}

/// One filesystem change notification for a single path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    pub op: FsOp,
    pub path: PathBuf,
}

impl FsEvent {
    pub fn new(op: FsOp, path: impl Into<PathBuf>) -> Self {
        Self {
            op,
            path: path.into(),
        }
    }

    /// Base name of the event path; `None` for `..` or a bare root.
    pub fn file_name(&self) -> Option<&OsStr> {
        self.path.file_name()
    }

    /// `true` when the base name carries the [`DELETE_PREFIX`].
    pub fn is_delete_request(&self) -> bool {
        self.file_name().is_some_and(has_delete_prefix::<OsStr>)
    }
}

/// `true` when `name` starts with [`DELETE_PREFIX`].
pub fn has_delete_prefix<S: AsRef<OsStr> + ?Sized>(name: &S) -> bool {
    name.as_ref()
        .as_encoded_bytes()
        .starts_with(DELETE_PREFIX.as_bytes())
}

/// Strip one leading [`DELETE_PREFIX`] from `name`; other names are returned as-is.
///
/// Works on the encoded bytes, so the rest of the name need not be UTF-8.
pub fn strip_delete_prefix<S: AsRef<OsStr> + ?Sized>(name: &S) -> &OsStr {
    let name = name.as_ref();
    match name.as_encoded_bytes().strip_prefix(DELETE_PREFIX.as_bytes()) {
        // SAFETY: the split point directly follows the non-empty ASCII prefix,
        // a boundary `OsStr::from_encoded_bytes_unchecked` accepts.
        Some(rest) => unsafe { OsStr::from_encoded_bytes_unchecked(rest) },
        None => name,
    }
}

// ---------------------------------------------------------------------------
// Audit actions
// ---------------------------------------------------------------------------

/// Action column of an audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// A file appeared in the hot directory.
    Created,
    /// A file in the hot directory was written.
    Modified,
    /// A file disappeared from the hot directory.
    Deleted,
    /// A file in the hot directory was renamed away.
    Renamed,
    /// A backup copy was written.
    Backup,
    /// A `delete_` request was carried out.
    Delete,
}

impl ActionKind {
    pub const ALL: [ActionKind; 6] = [
        ActionKind::Created,
        ActionKind::Modified,
        ActionKind::Deleted,
        ActionKind::Renamed,
        ActionKind::Backup,
        ActionKind::Delete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Created => "CREATED",
            ActionKind::Modified => "MODIFIED",
            ActionKind::Deleted => "DELETED",
            ActionKind::Renamed => "RENAMED",
            ActionKind::Backup => "BACKUP",
            ActionKind::Delete => "DELETE",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CoreError::UnknownAction(s.to_string()))
    }
}

/// One line of the append-only audit log.
///
/// Formats as `YYYY-MM-DD HH:MM:SS ACTION path` (no trailing newline).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRecord {
    pub timestamp: NaiveDateTime,
    pub action: ActionKind,
    pub path: PathBuf,
}

impl ActionRecord {
    /// Record `action` on `path` stamped with the current local time.
    pub fn now(action: ActionKind, path: &Path) -> Self {
        Self {
            timestamp: Local::now().naive_local(),
            action,
            path: path.to_path_buf(),
        }
    }
}

impl fmt::Display for ActionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.timestamp.format(RECORD_TIMESTAMP_FORMAT),
            self.action,
            self.path.display()
        )
    }
}

impl FromStr for ActionRecord {
    type Err = CoreError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_end_matches(['\r', '\n']);
        // The path is last so it may contain spaces.
        let mut parts = line.splitn(4, ' ');
        let (Some(date), Some(time), Some(action), Some(path)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(CoreError::MalformedRecord(line.to_string()));
        };
        if path.is_empty() {
            return Err(CoreError::MalformedRecord(line.to_string()));
        }

        let timestamp =
            NaiveDateTime::parse_from_str(&format!("{date} {time}"), RECORD_TIMESTAMP_FORMAT)
                .map_err(|source| CoreError::InvalidTimestamp {
                    line: line.to_string(),
                    source,
                })?;

        Ok(Self {
            timestamp,
            action: action.parse()?,
            path: PathBuf::from(path),
        })
    }
}
