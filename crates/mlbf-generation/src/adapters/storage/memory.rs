use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::StorageError;
use crate::ports::outbound::ArtifactStorage;

/// In-memory artifact storage for tests and dry runs.
#[derive(Debug, Default)]
pub struct InMemoryArtifactStorage {
    blobs: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryArtifactStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored path, sorted
    pub fn paths(&self) -> Vec<String> {
        self.blobs
            .read()
            .map(|blobs| blobs.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Drop a stored blob
    pub fn remove(&self, path: &str) {
        if let Ok(mut blobs) = self.blobs.write() {
            blobs.remove(path);
        }
    }
}

fn poisoned(path: &str) -> StorageError {
    StorageError::Io {
        path: path.to_string(),
        message: "storage lock poisoned".to_string(),
    }
}

impl ArtifactStorage for InMemoryArtifactStorage {
    fn write(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        if path.is_empty() {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        let mut blobs = self.blobs.write().map_err(|_| poisoned(path))?;
        blobs.insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    fn read(&self, path: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let blobs = self.blobs.read().map_err(|_| poisoned(path))?;
        Ok(blobs.get(path).cloned())
    }
}
