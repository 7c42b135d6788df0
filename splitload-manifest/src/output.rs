//! Output filesystem abstraction
//!
//! The manifest writer goes through [`OutputFileSystem`] so builds can land
//! on disk, in memory for tests, or anywhere an embedder points it.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Error produced by an output filesystem
#[derive(Error, Debug)]
pub enum OutputError {
    /// The path does not exist
    #[error("path not found: {path}")]
    NotFound { path: String },

    /// An underlying io operation failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other backend failure
    #[error("{message}")]
    Other { message: String },
}

/// Where manifest builds write their artifacts.
pub trait OutputFileSystem: Send + Sync {
    /// Write `content` to `path`, replacing any previous content
    fn write_file(&self, path: &Path, content: &str) -> Result<(), OutputError>;

    /// Read the content previously written to `path`
    fn read_file(&self, path: &Path) -> Result<String, OutputError>;

    /// Create a directory and its parents; an existing directory is not an error
    fn create_dir_all(&self, path: &Path) -> Result<(), OutputError>;

    /// Whether `path` currently exists
    fn exists(&self, path: &Path) -> bool;
}

/// In-memory output filesystem.
///
/// Clones share the same file map, so a test can hand one clone to the
/// writer and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct MemoryOutput {
    files: Arc<RwLock<BTreeMap<PathBuf, String>>>,
    dirs: Arc<RwLock<BTreeSet<PathBuf>>>,
}

impl MemoryOutput {
    /// Create an empty in-memory filesystem
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files currently stored
    pub fn file_count(&self) -> usize {
        match self.files.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

impl OutputFileSystem for MemoryOutput {
    fn write_file(&self, path: &Path, content: &str) -> Result<(), OutputError> {
        let mut files = self.files.write().map_err(|_| OutputError::Other {
            message: String::from("lock poisoned"),
        })?;
        files.insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn read_file(&self, path: &Path) -> Result<String, OutputError> {
        let files = self.files.read().map_err(|_| OutputError::Other {
            message: String::from("lock poisoned"),
        })?;
        files.get(path).cloned().ok_or_else(|| OutputError::NotFound {
            path: path.display().to_string(),
        })
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), OutputError> {
        let mut dirs = self.dirs.write().map_err(|_| OutputError::Other {
            message: String::from("lock poisoned"),
        })?;
        let mut current = PathBuf::new();
        for part in path.components() {
            current.push(part);
            dirs.insert(current.clone());
        }
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let in_files = match self.files.read() {
            Ok(guard) => guard.contains_key(path),
            Err(_) => false,
        };
        let in_dirs = match self.dirs.read() {
            Ok(guard) => guard.contains(path),
            Err(_) => false,
        };
        in_files || in_dirs
    }
}

/// Output filesystem backed by the host disk.
#[derive(Debug, Clone, Default)]
pub struct NativeOutput;

impl NativeOutput {
    /// Create a native filesystem handle
    pub fn new() -> Self {
        Self
    }
}

impl OutputFileSystem for NativeOutput {
    fn write_file(&self, path: &Path, content: &str) -> Result<(), OutputError> {
        fs::write(path, content)?;
        Ok(())
    }

    fn read_file(&self, path: &Path) -> Result<String, OutputError> {
        if !path.exists() {
            return Err(OutputError::NotFound {
                path: path.display().to_string(),
            });
        }
        Ok(fs::read_to_string(path)?)
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), OutputError> {
        fs::create_dir_all(path)?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}
