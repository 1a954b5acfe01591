//! Atomic JSON file operations.
//!
//! Writes go to a uniquely named temporary file in the target's directory that
//! is fsynced and renamed over the target, so readers never observe a
//! half-written document and concurrent writers never share a temp file.
//! Read-modify-write cycles additionally hold an exclusive `fs2` lock on a
//! `.lock` sibling. Lock files stay on disk so every process locks the same
//! inode.

use fs2::FileExt;
use serde::{Serialize, de::DeserializeOwned};
use seqthink_core::SeqThinkError;
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AtomicFileError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Lock error on {path}: {message}")]
    Lock { path: PathBuf, message: String },
}

impl From<AtomicFileError> for SeqThinkError {
    fn from(err: AtomicFileError) -> Self {
        match err {
            AtomicFileError::Json { .. } => SeqThinkError::Serialization {
                format: "JSON".to_string(),
                message: err.to_string(),
            },
            other => SeqThinkError::io(other.to_string()),
        }
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> AtomicFileError + '_ {
    move |source| AtomicFileError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// A handle to a JSON document on disk.
pub struct AtomicJsonFile<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> AtomicJsonFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Loads and deserializes the file.
    ///
    /// - `Ok(None)`: file missing or blank
    /// - `Err`: unreadable or not valid JSON for `T`
    pub fn load(&self) -> Result<Option<T>, AtomicFileError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).map_err(io_error(&self.path))?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| AtomicFileError::Json {
                path: self.path.clone(),
                source,
            })
    }

    /// Replaces the file contents with `data`.
    pub fn save(&self, data: &T) -> Result<(), AtomicFileError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }

        let json = serde_json::to_string_pretty(data).map_err(|source| AtomicFileError::Json {
            path: self.path.clone(),
            source,
        })?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp_file = NamedTempFile::new_in(dir).map_err(io_error(dir))?;
        tmp_file
            .write_all(json.as_bytes())
            .and_then(|_| tmp_file.as_file().sync_all())
            .map_err(io_error(tmp_file.path()))?;

        tmp_file
            .persist(&self.path)
            .map(|_| ())
            .map_err(|e| io_error(&self.path)(e.error))
    }

    /// Takes the exclusive lock guarding this file's read-modify-write cycles.
    pub fn lock(&self) -> Result<FileLock, AtomicFileError> {
        FileLock::acquire(&self.path)
    }

    /// Loads, applies `f` and saves while holding the exclusive lock.
    ///
    /// Nothing is written when `f` fails.
    pub fn update<F, R>(&self, default_value: T, f: F) -> Result<R, AtomicFileError>
    where
        F: FnOnce(&mut T) -> Result<R, AtomicFileError>,
    {
        let _lock = self.lock()?;

        let mut data = self.load()?.unwrap_or(default_value);
        let result = f(&mut data)?;
        self.save(&data)?;

        Ok(result)
    }

    /// Removes the file. Returns whether it existed.
    pub fn remove(&self) -> Result<bool, AtomicFileError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(&self.path)(e)),
        }
    }
}

/// Exclusive advisory lock on `<path>.lock`, released on drop.
pub struct FileLock {
    file: File,
}

impl FileLock {
    /// Blocks until the lock sibling of `path` is held exclusively.
    pub fn acquire(path: &Path) -> Result<Self, AtomicFileError> {
        let lock_path = path.with_extension("lock");
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(io_error(&lock_path))?;

        file.lock_exclusive().map_err(|e| AtomicFileError::Lock {
            path: lock_path.clone(),
            message: e.to_string(),
        })?;

        Ok(FileLock { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            tracing::warn!("[AtomicJsonFile] Failed to release lock: {}", e);
        }
    }
}
