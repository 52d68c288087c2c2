//! File-based snapshot backend.

use crate::backend::SnapshotBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// A single-file snapshot backend.
///
/// Each `store` writes the full snapshot to a sibling temporary file and
/// renames it over the destination, so a failed write never leaves a
/// truncated snapshot behind.
///
/// # Durability
///
/// With `sync` enabled the temporary file is `sync_all`ed before the rename.
///
/// # Example
///
/// ```no_run
/// use flexdb_storage::{FileBackend, SnapshotBackend};
/// use std::path::Path;
///
/// let backend = FileBackend::new(Path::new("data/db.json"), true);
/// backend.store(b"{}").unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    sync: bool,
    /// Serializes writers so two stores never share the temp file.
    write_lock: Mutex<()>,
}

impl FileBackend {
    /// Creates a backend for the file at `path`.
    ///
    /// The file does not need to exist; it is created on the first store
    /// together with any missing parent directories.
    #[must_use]
    pub fn new(path: &Path, sync: bool) -> Self {
        Self {
            path: path.to_path_buf(),
            sync,
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the path to the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_temp(&self, temp: &Path, data: &[u8]) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(temp)?;
        file.write_all(data)?;
        file.flush()?;
        if self.sync {
            file.sync_all()?;
        }
        Ok(())
    }
}

impl SnapshotBackend for FileBackend {
    fn load(&self) -> StorageResult<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn store(&self, data: &[u8]) -> StorageResult<()> {
        let _guard = self.write_lock.lock();
        let temp = self.temp_path();

        let result = self
            .write_temp(&temp, data)
            .and_then(|()| fs::rename(&temp, &self.path));

        if let Err(source) = result {
            let _ = fs::remove_file(&temp);
            tracing::warn!(path = %self.path.display(), error = %source, "snapshot write failed");
            return Err(StorageError::WriteFailed {
                path: self.path.clone(),
                source,
            });
        }

        if self.sync {
            if let Some(parent) = self.path.parent() {
                // Directory fsync is best effort; not every platform allows it.
                if let Ok(dir) = File::open(parent) {
                    let _ = dir.sync_all();
                }
            }
        }

        tracing::debug!(path = %self.path.display(), bytes = data.len(), "snapshot stored");
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
