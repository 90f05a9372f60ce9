//! Tracking state: durable map of watched path to last-seen time.
//!
//! Persisted as one JSON document:
//!
//! ```json
//! { "files": { "./hot/report.txt": "2025-03-09T07:05:01.123456789Z" } }
//! ```
//!
//! Paths that are not valid UTF-8 go under `raw_files`, keyed by the hex of
//! their bytes, so distinct names never collapse into one key.
//!
//! Saves rewrite the whole document through `<file>.tmp` + rename, so an
//! interrupted or failed save leaves the previous snapshot in place.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use hotfolder_core::FileSystem;
use serde::{Deserialize, Serialize};

use crate::error::{io_err, SyncError};

/// Path → last create/write time.
pub type TrackedFiles = BTreeMap<PathBuf, DateTime<Utc>>;

/// In-memory tracking state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TrackingDocument", into = "TrackingDocument")]
pub struct TrackingState {
    pub files: TrackedFiles,
}

impl TrackingState {
    /// Insert or refresh `path` with `seen_at`.
    pub fn touch(&mut self, path: &Path, seen_at: DateTime<Utc>) {
        self.files.insert(path.to_path_buf(), seen_at);
    }

    /// Remove `path`, returning its last-seen time if it was tracked.
    pub fn evict(&mut self, path: &Path) -> Option<DateTime<Utc>> {
        self.files.remove(path)
    }

    pub fn last_seen(&self, path: &Path) -> Option<DateTime<Utc>> {
        self.files.get(path).copied()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// On-disk shape of [`TrackingState`].
#[derive(Debug, Default, Serialize, Deserialize)]
struct TrackingDocument {
    #[serde(default)]
    files: BTreeMap<String, DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    raw_files: BTreeMap<String, DateTime<Utc>>,
}

impl From<TrackingState> for TrackingDocument {
    fn from(state: TrackingState) -> Self {
        let mut doc = TrackingDocument::default();
        for (path, seen_at) in state.files {
            match path.into_os_string().into_string() {
                Ok(text) => {
                    doc.files.insert(text, seen_at);
                }
                Err(raw) => {
                    doc.raw_files.insert(raw_key(PathBuf::from(raw)), seen_at);
                }
            }
        }
        doc
    }
}

impl TryFrom<TrackingDocument> for TrackingState {
    type Error = hex::FromHexError;

    fn try_from(doc: TrackingDocument) -> Result<Self, Self::Error> {
        let mut files: TrackedFiles = doc
            .files
            .into_iter()
            .map(|(path, seen_at)| (PathBuf::from(path), seen_at))
            .collect();
        for (key, seen_at) in doc.raw_files {
            files.insert(path_from_raw_key(&key)?, seen_at);
        }
        Ok(Self { files })
    }
}

#[cfg(unix)]
fn raw_key(path: PathBuf) -> String {
    use std::os::unix::ffi::OsStrExt;
    hex::encode(path.as_os_str().as_bytes())
}

#[cfg(unix)]
fn path_from_raw_key(key: &str) -> Result<PathBuf, hex::FromHexError> {
    use std::ffi::OsString;
    use std::os::unix::ffi::OsStringExt;
    Ok(PathBuf::from(OsString::from_vec(hex::decode(key)?)))
}

// Non-Unix paths only fail UTF-8 on unpaired surrogates; those are stored lossily.
#[cfg(not(unix))]
fn raw_key(path: PathBuf) -> String {
    hex::encode(path.to_string_lossy().as_bytes())
}

#[cfg(not(unix))]
fn path_from_raw_key(key: &str) -> Result<PathBuf, hex::FromHexError> {
    let bytes = hex::decode(key)?;
    Ok(PathBuf::from(String::from_utf8_lossy(&bytes).into_owned()))
}

/// Loads and saves [`TrackingState`] at a fixed path.
#[derive(Debug, Clone)]
pub struct TrackingStore {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
}

impl TrackingStore {
    pub fn new(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the state, or an empty state if nothing usable is on disk.
    ///
    /// A missing file is the normal first-run case. An unreadable or corrupt
    /// file is logged and treated the same way.
    pub fn load(&self) -> TrackingState {
        match self.try_load() {
            Ok(state) => state,
            Err(err) => {
                tracing::warn!(
                    "ignoring unreadable tracking state {}: {err}",
                    self.path.display()
                );
                TrackingState::default()
            }
        }
    }

    /// Load the state, surfacing read and parse errors.
    ///
    /// Returns an empty state if the file does not yet exist.
    pub fn try_load(&self) -> Result<TrackingState, SyncError> {
        let contents = match self.fs.read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(TrackingState::default()),
            Err(err) => return Err(io_err(&self.path, err)),
        };
        Ok(serde_json::from_str(&contents)?)
    }

    /// Save `state` atomically.
    ///
    /// Writes to `<path>.tmp` then renames to `<path>`.
    pub fn save(&self, state: &TrackingState) -> Result<(), SyncError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            self.fs.create_dir_all(dir).map_err(|e| io_err(dir, e))?;
        }

        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.tmp_path();
        self.fs
            .write(&tmp, json.as_bytes())
            .map_err(|e| io_err(&tmp, e))?;
        if let Err(e) = self.fs.rename(&tmp, &self.path) {
            if let Err(cleanup) = self.fs.remove(&tmp) {
                tracing::warn!("failed to remove {}: {cleanup}", tmp.display());
            }
            return Err(io_err(&self.path, e));
        }
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, SubsecRound};
    use hotfolder_core::MemFs;

    fn store() -> (Arc<MemFs>, TrackingStore) {
        let fs = Arc::new(MemFs::new());
        let store = TrackingStore::new(fs.clone(), "state/hotfolder.state.json");
        (fs, store)
    }

    #[test]
    fn empty_state_when_file_missing() {
        let (_fs, store) = store();
        let state = store.try_load().unwrap();
        assert!(state.is_empty());
        assert!(store.load().is_empty());
    }

    #[test]
    fn roundtrip_save_load() {
        let (_fs, store) = store();
        let mut state = TrackingState::default();
        let now = Utc::now();
        state.touch(Path::new("./hot/file1.txt"), now);
        state.touch(Path::new("./hot/file2.txt"), now - Duration::seconds(90));

        store.save(&state).unwrap();
        let loaded = store.try_load().unwrap();

        assert_eq!(loaded, state);
        assert_eq!(loaded.last_seen(Path::new("./hot/file1.txt")), Some(now));
    }

    #[test]
    fn roundtrip_loss_is_below_one_second() {
        let (_fs, store) = store();
        let mut state = TrackingState::default();
        let now = Utc::now();
        state.touch(Path::new("a"), now);

        store.save(&state).unwrap();
        let seen = store.load().last_seen(Path::new("a")).unwrap();

        assert_eq!(seen.trunc_subsecs(0), now.trunc_subsecs(0));
    }

    #[test]
    fn document_uses_files_object_with_rfc3339_values() {
        let (fs, store) = store();
        let mut state = TrackingState::default();
        let at = DateTime::parse_from_rfc3339("2025-03-09T07:05:01Z")
            .unwrap()
            .with_timezone(&Utc);
        state.touch(Path::new("./hot/report.txt"), at);

        store.save(&state).unwrap();

        let raw = fs.read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value["files"]["./hot/report.txt"],
            serde_json::json!("2025-03-09T07:05:01Z")
        );
    }

    #[test]
    fn corrupt_file_loads_as_empty() {
        let (fs, store) = store();
        fs.write(store.path(), b"{ not json").unwrap();

        assert!(matches!(store.try_load(), Err(SyncError::Json(_))));
        assert!(store.load().is_empty());
    }

    #[test]
    fn document_without_files_key_loads_as_empty() {
        let (fs, store) = store();
        fs.write(store.path(), b"{}").unwrap();
        assert!(store.try_load().unwrap().is_empty());
    }

    #[test]
    fn failed_save_keeps_previous_snapshot() {
        let (fs, store) = store();
        let mut state = TrackingState::default();
        state.touch(Path::new("kept"), Utc::now());
        store.save(&state).unwrap();

        fs.deny_writes("state");
        state.touch(Path::new("lost"), Utc::now());
        let err = store.save(&state).unwrap_err();
        assert!(matches!(err, SyncError::Io { .. }));

        fs.allow_writes();
        let loaded = store.load();
        assert!(loaded.contains(Path::new("kept")));
        assert!(!loaded.contains(Path::new("lost")));
    }

    #[test]
    fn tmp_file_cleaned_up_after_save() {
        let (fs, store) = store();
        store.save(&TrackingState::default()).unwrap();
        assert_eq!(
            fs.paths(),
            vec![PathBuf::from("state/hotfolder.state.json")]
        );
    }

    #[test]
    fn evict_returns_previous_timestamp() {
        let mut state = TrackingState::default();
        let at = Utc::now();
        state.touch(Path::new("x"), at);
        assert_eq!(state.evict(Path::new("x")), Some(at));
        assert_eq!(state.evict(Path::new("x")), None);
        assert!(state.is_empty());
    }

    #[test]
    fn failed_rename_removes_tmp_file() {
        let (fs, store) = store();
        fs.deny_writes(store.path());

        let err = store.save(&TrackingState::default()).unwrap_err();

        assert!(matches!(err, SyncError::Io { ref path, .. } if path == store.path()));
        assert!(fs.paths().is_empty(), "left behind: {:?}", fs.paths());
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_paths_roundtrip_without_collisions() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let (fs, store) = store();
        let mut state = TrackingState::default();
        let now = Utc::now();
        let e_acute = Path::new("hot").join(OsStr::from_bytes(b"caf\xe9.txt"));
        let e_grave = Path::new("hot").join(OsStr::from_bytes(b"caf\xe8.txt"));
        state.touch(&e_acute, now);
        state.touch(&e_grave, now - Duration::seconds(5));
        state.touch(Path::new("hot/plain.txt"), now);

        store.save(&state).unwrap();

        let raw = fs.read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["files"].as_object().unwrap().len(), 1);
        assert_eq!(value["raw_files"].as_object().unwrap().len(), 2);
        assert_eq!(store.try_load().unwrap(), state);
    }

    #[test]
    fn bad_raw_key_is_a_parse_error() {
        let (fs, store) = store();
        fs.write(store.path(), br#"{"files":{},"raw_files":{"zz":"2025-03-09T07:05:01Z"}}"#)
            .unwrap();

        assert!(matches!(store.try_load(), Err(SyncError::Json(_))));
    }
}
