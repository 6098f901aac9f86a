use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};
use crate::storage::FileStorage;

/// Blobs kept in process memory, keyed by path.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    blobs: RefCell<HashMap<PathBuf, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) {
        self.blobs.borrow_mut().insert(path.into(), bytes.into());
    }

    /// Stored paths, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.blobs.borrow().keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl FileStorage for MemoryStorage {
    fn read_blob(&self, path: &Path) -> Result<Vec<u8>> {
        self.blobs
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| {
                PipelineError::MissingData(format!("File not found: {}", path.display()))
            })
    }

    fn write_blob(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        self.insert(path, bytes);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.blobs.borrow().contains_key(path)
    }
}
