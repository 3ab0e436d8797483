//! Outbound Ports (Driven Ports)
//!
//! Interfaces the generation service needs from the host application.

use async_trait::async_trait;

use crate::domain::{Attachment, CatalogSnapshot, PublishMetadata, SignOffStatus};
use crate::error::{CatalogError, ConfigStoreError, LockError, PublishError, StorageError};

/// Block records and the addon version catalog
///
/// Production: `JsonCatalogSource`
/// Testing: `MockCatalog` (test_utils)
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Every block record and every known addon version, distributable or
    /// not, from one consistent read
    async fn snapshot(&self) -> Result<CatalogSnapshot, CatalogError>;
}

/// Process-wide key/value settings holding JSON scalars
///
/// Production: `JsonFileConfigStore`
/// Testing: `InMemoryConfigStore`
pub trait ConfigStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>, ConfigStoreError>;

    fn set(&self, key: &str, value: serde_json::Value) -> Result<(), ConfigStoreError>;
}

/// Blob storage for generation artifacts
///
/// Paths are `/`-separated and relative to the storage root.
pub trait ArtifactStorage: Send + Sync {
    fn write(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// `None` when nothing was ever written at `path`
    fn read(&self, path: &str) -> Result<Option<Vec<u8>>, StorageError>;
}

/// Remote service that serves the filter to clients
#[async_trait]
pub trait DistributionClient: Send + Sync {
    async fn publish_attachment(
        &self,
        metadata: &PublishMetadata,
        attachment: Attachment,
    ) -> Result<(), PublishError>;

    /// Ask the service to review or sign the uploaded changes
    async fn request_sign_off(&self, status: SignOffStatus) -> Result<(), PublishError>;
}

/// Wall clock in milliseconds since epoch
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// Mutual exclusion around a whole pipeline run
pub trait GenerationLock: Send + Sync {
    /// Take the lock without waiting
    fn try_acquire(&self) -> Result<LockGuard, LockError>;
}

/// Held for the duration of a run; dropping it releases the lock
pub struct LockGuard {
    _inner: Option<Box<dyn Send>>,
}

impl LockGuard {
    pub fn new(inner: impl Send + 'static) -> Self {
        Self {
            _inner: Some(Box::new(inner)),
        }
    }

    /// Guard for locks with nothing to release
    pub fn unlocked() -> Self {
        Self { _inner: None }
    }
}

impl std::fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockGuard")
            .field("held", &self._inner.is_some())
            .finish()
    }
}
