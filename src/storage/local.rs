use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::storage::FileStorage;

/// Files under a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Absolute location of a storage path.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

impl FileStorage for LocalStorage {
    fn read_blob(&self, path: &Path) -> Result<Vec<u8>> {
        let full_path = self.resolve(path);
        fs::read(&full_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PipelineError::MissingData(format!("File not found: {}", full_path.display()))
            } else {
                PipelineError::Io(e)
            }
        })
    }

    /// Writes land in a temporary file next to the target and are renamed into place.
    fn write_blob(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let full_path = self.resolve(path);
        let directory = full_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        fs::create_dir_all(&directory)?;

        let mut temp_file = NamedTempFile::new_in(&directory)?;
        temp_file.write_all(bytes)?;
        temp_file.flush()?;
        temp_file.persist(&full_path).map_err(|e| PipelineError::Io(e.error))?;

        debug!("Wrote {} bytes to {}", bytes.len(), full_path.display());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).is_file()
    }
}
