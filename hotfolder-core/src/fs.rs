//! Filesystem capability.
//!
//! Every component that touches files takes an `Arc<dyn FileSystem>` instead
//! of calling `std::fs` directly, so the monitor runs against the real disk
//! ([`OsFs`]) and tests run against memory ([`MemFs`]).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;
use std::io::{self, ErrorKind, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Raw file primitives used by the monitor.
pub trait FileSystem: Debug + Send + Sync {
    /// Read the full contents of `path`.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Create or truncate `path` and write `contents`.
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Open `path` in append/create mode, write `contents`, and close it again.
    fn append(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Remove the file at `path`.
    fn remove(&self, path: &Path) -> io::Result<()>;

    /// Rename `from` to `to`, replacing `to` if it exists.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Whether anything exists at `path`.
    fn exists(&self, path: &Path) -> io::Result<bool>;

    /// Create `path` and all missing parents.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// [`read`](FileSystem::read) decoded as UTF-8.
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|e| io::Error::new(ErrorKind::InvalidData, e))
    }
}

// ---------------------------------------------------------------------------
// OsFs
// ---------------------------------------------------------------------------

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFs;

impl FileSystem for OsFs {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        std::fs::write(path, contents)
    }

    fn append(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        file.write_all(contents)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::rename(from, to)
    }

    fn exists(&self, path: &Path) -> io::Result<bool> {
        path.try_exists()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }
}

// ---------------------------------------------------------------------------
// MemFs
// ---------------------------------------------------------------------------

/// In-memory [`FileSystem`] for tests.
///
/// Paths are normalised by dropping `.` components, so `./hot/a` and `hot/a`
/// name the same file. Parent directories are not required to exist.
#[derive(Debug, Default)]
pub struct MemFs {
    inner: Mutex<MemState>,
}

#[derive(Debug, Default)]
struct MemState {
    files: BTreeMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
    read_only: Vec<PathBuf>,
}

impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write, append, or rename into `prefix` fail with
    /// `PermissionDenied`.
    pub fn deny_writes(&self, prefix: impl AsRef<Path>) {
        self.state().read_only.push(normalize(prefix.as_ref()));
    }

    /// Lift every restriction added by [`deny_writes`](MemFs::deny_writes).
    pub fn allow_writes(&self) {
        self.state().read_only.clear();
    }

    /// All file paths currently stored, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.state().files.keys().cloned().collect()
    }

    fn state(&self) -> MutexGuard<'_, MemState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MemState {
    fn check_writable(&self, path: &Path) -> io::Result<()> {
        if self.read_only.iter().any(|prefix| path.starts_with(prefix)) {
            return Err(io::Error::new(
                ErrorKind::PermissionDenied,
                format!("read-only: {}", path.display()),
            ));
        }
        if self.dirs.contains(path) {
            return Err(io::Error::other(format!(
                "is a directory: {}",
                path.display()
            )));
        }
        Ok(())
    }
}

fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        ErrorKind::NotFound,
        format!("no such file: {}", path.display()),
    )
}

impl FileSystem for MemFs {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let path = normalize(path);
        self.state()
            .files
            .get(&path)
            .cloned()
            .ok_or_else(|| not_found(&path))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let path = normalize(path);
        let mut state = self.state();
        state.check_writable(&path)?;
        state.files.insert(path, contents.to_vec());
        Ok(())
    }

    fn append(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let path = normalize(path);
        let mut state = self.state();
        state.check_writable(&path)?;
        state
            .files
            .entry(path)
            .or_default()
            .extend_from_slice(contents);
        Ok(())
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        let path = normalize(path);
        self.state()
            .files
            .remove(&path)
            .map(|_| ())
            .ok_or_else(|| not_found(&path))
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let (from, to) = (normalize(from), normalize(to));
        let mut state = self.state();
        state.check_writable(&to)?;
        let contents = state.files.remove(&from).ok_or_else(|| not_found(&from))?;
        state.files.insert(to, contents);
        Ok(())
    }

    fn exists(&self, path: &Path) -> io::Result<bool> {
        let path = normalize(path);
        let state = self.state();
        Ok(state.files.contains_key(&path) || state.dirs.contains(&path))
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let path = normalize(path);
        let mut state = self.state();
        for dir in path.ancestors().filter(|p| !p.as_os_str().is_empty()) {
            state.dirs.insert(dir.to_path_buf());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mem_fs_treats_dot_prefixed_paths_as_equal() {
        let fs = MemFs::new();
        fs.write(Path::new("./hot/a.txt"), b"A").unwrap();
        assert_eq!(fs.read(Path::new("hot/a.txt")).unwrap(), b"A");
        assert!(fs.exists(Path::new("hot/./a.txt")).unwrap());
    }

    #[test]
    fn mem_fs_append_creates_then_extends() {
        let fs = MemFs::new();
        let log = Path::new("audit.log");
        fs.append(log, b"one\n").unwrap();
        fs.append(log, b"two\n").unwrap();
        assert_eq!(fs.read_to_string(log).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn mem_fs_remove_missing_is_not_found() {
        let fs = MemFs::new();
        let err = fs.remove(Path::new("ghost")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn mem_fs_denied_prefix_rejects_writes_but_keeps_reads() {
        let fs = MemFs::new();
        fs.write(Path::new("backup/a.bak"), b"old").unwrap();
        fs.deny_writes("backup");

        let err = fs.write(Path::new("backup/a.bak"), b"new").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
        assert_eq!(fs.read(Path::new("backup/a.bak")).unwrap(), b"old");

        fs.allow_writes();
        fs.write(Path::new("backup/a.bak"), b"new").unwrap();
    }

    #[test]
    fn mem_fs_rename_moves_contents() {
        let fs = MemFs::new();
        fs.write(Path::new("state.json.tmp"), b"{}").unwrap();
        fs.rename(Path::new("state.json.tmp"), Path::new("state.json"))
            .unwrap();
        assert!(!fs.exists(Path::new("state.json.tmp")).unwrap());
        assert_eq!(fs.read(Path::new("state.json")).unwrap(), b"{}");
    }

    #[test]
    fn mem_fs_directories_exist_but_are_not_files() {
        let fs = MemFs::new();
        fs.create_dir_all(Path::new("./hot/nested")).unwrap();
        assert!(fs.exists(Path::new("hot")).unwrap());
        assert!(fs.write(Path::new("hot"), b"x").is_err());
        assert!(fs.paths().is_empty());
    }
}
