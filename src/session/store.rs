//! Snapshot Storage
//!
//! One string value, read on start and written after every transition.
//! Absence and corruption both fall back to the empty state upstream, so
//! loading is infallible by construction.

use std::fs;
use std::path::PathBuf;

/// Snapshot store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying filesystem failure.
    #[error("snapshot io: {0}")]
    Io(#[from] std::io::Error),
}

/// Get/set of a single serialized snapshot.
pub trait SnapshotStore {
    /// Read the last saved snapshot, if one exists and is readable.
    fn load(&self) -> Option<String>;

    /// Persist a snapshot, replacing any previous one.
    fn save(&mut self, snapshot: &str) -> Result<(), StoreError>;
}

/// Snapshot store backed by a single file on disk.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store at the given path. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotStore for FileStore {
    fn load(&self) -> Option<String> {
        fs::read_to_string(&self.path).ok()
    }

    fn save(&mut self, snapshot: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, snapshot)?;
        Ok(())
    }
}

/// In-memory store for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    value: Option<String>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with a snapshot.
    pub fn with_value(value: impl Into<String>) -> Self {
        Self { value: Some(value.into()) }
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Option<String> {
        self.value.clone()
    }

    fn save(&mut self, snapshot: &str) -> Result<(), StoreError> {
        self.value = Some(snapshot.to_string());
        Ok(())
    }
}
