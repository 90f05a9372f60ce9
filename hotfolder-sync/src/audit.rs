//! Read-side helpers for the audit log: view, tail, regex filter.

use std::path::Path;

use hotfolder_core::FileSystem;
use regex::Regex;

use crate::error::{io_err, SyncError};

/// The whole audit log as text.
pub fn read_log(fs: &dyn FileSystem, path: &Path) -> Result<String, SyncError> {
    fs.read_to_string(path).map_err(|e| io_err(path, e))
}

/// Lines of the audit log matching `pattern`.
///
/// The pattern is compiled before the log is touched, so an invalid pattern
/// fails with [`SyncError::Pattern`] and nothing else happens.
pub fn filter_log(fs: &dyn FileSystem, path: &Path, pattern: &str) -> Result<Vec<String>, SyncError> {
    let regex = Regex::new(pattern)?;
    let text = read_log(fs, path)?;
    Ok(filter_lines(&text, &regex))
}

/// Lines of `text` matching `regex`, in order. Empty lines never match.
pub fn filter_lines(text: &str, regex: &Regex) -> Vec<String> {
    text.lines()
        .filter(|line| !line.is_empty() && regex.is_match(line))
        .map(str::to_owned)
        .collect()
}

/// The last `n` lines of `text`.
pub fn tail(text: &str, n: usize) -> Vec<&str> {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].to_vec()
}
