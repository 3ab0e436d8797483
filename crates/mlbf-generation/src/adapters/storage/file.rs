use std::io::Write;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::StorageError;
use crate::ports::outbound::ArtifactStorage;

/// Filesystem artifact storage rooted at a directory.
///
/// Every write lands in a temp file first and is renamed into place, so a
/// reader never sees a half-written artifact.
#[derive(Clone, Debug)]
pub struct FileArtifactStorage {
    root: PathBuf,
}

impl FileArtifactStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a relative artifact path under the root
    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if path.is_empty() || escapes {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

fn io_error(path: &Path, e: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

impl ArtifactStorage for FileArtifactStorage {
    fn write(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }

        // Write atomically via temp file
        let temp_path = target.with_extension("tmp");
        let mut file = std::fs::File::create(&temp_path).map_err(|e| io_error(&temp_path, e))?;
        file.write_all(bytes).map_err(|e| io_error(&temp_path, e))?;
        file.sync_all().map_err(|e| io_error(&temp_path, e))?;
        std::fs::rename(&temp_path, &target).map_err(|e| io_error(&target, e))?;

        debug!("[mlbf] Wrote {} bytes to {}", bytes.len(), target.display());
        Ok(())
    }

    fn read(&self, path: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let target = self.resolve(path)?;
        match std::fs::read(&target) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&target, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileArtifactStorage::new(dir.path());

        storage.write("123/blocked.json", b"[]").unwrap();

        assert_eq!(storage.read("123/blocked.json").unwrap(), Some(b"[]".to_vec()));
        assert!(dir.path().join("123").join("blocked.json").exists());
        assert!(!dir.path().join("123").join("blocked.tmp").exists());
    }

    #[test]
    fn test_missing_artifact_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileArtifactStorage::new(dir.path());
        assert_eq!(storage.read("1/filter").unwrap(), None);
    }

    #[test]
    fn test_overwrite_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileArtifactStorage::new(dir.path());

        storage.write("1/filter", &[1, 2, 3]).unwrap();
        storage.write("1/filter", &[4]).unwrap();

        assert_eq!(storage.read("1/filter").unwrap(), Some(vec![4]));
    }

    #[test]
    fn test_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileArtifactStorage::new(dir.path());

        for bad in ["", "../outside", "/etc/passwd", "a/../../b"] {
            assert!(
                matches!(storage.write(bad, b"x"), Err(StorageError::InvalidPath(_))),
                "{} should be rejected",
                bad
            );
        }
    }
}
