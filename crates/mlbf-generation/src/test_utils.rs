//! Fakes for exercising the generation service without real I/O

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::adapters::{InMemoryArtifactStorage, InMemoryConfigStore, NoopGenerationLock};
use crate::domain::{
    Attachment, BlockRecord, CatalogSnapshot, CatalogVersion, PublishMetadata, SignOffStatus,
    VersionRange,
};
use crate::error::{CatalogError, PublishError};
use crate::ports::outbound::{CatalogSource, Clock, DistributionClient};
use crate::service::{GenerationPorts, GenerationService, GenerationSettings};

/// Catalog held in memory; block and version lists can change between runs
#[derive(Default)]
pub struct MockCatalog {
    blocks: RwLock<Vec<BlockRecord>>,
    versions: RwLock<Vec<CatalogVersion>>,
    failing: AtomicBool,
    reads: AtomicUsize,
}

impl MockCatalog {
    pub fn new(blocks: Vec<BlockRecord>, versions: Vec<CatalogVersion>) -> Self {
        Self {
            blocks: RwLock::new(blocks),
            versions: RwLock::new(versions),
            ..Self::default()
        }
    }

    pub async fn add_block(&self, block: BlockRecord) {
        self.blocks.write().await.push(block);
    }

    pub async fn add_version(&self, guid: &str, version: &str) {
        self.versions
            .write()
            .await
            .push(CatalogVersion::new(guid, version));
    }

    /// Make every call fail as if the store were down
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of catalog snapshots taken so far
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogSource for MockCatalog {
    async fn snapshot(&self) -> Result<CatalogSnapshot, CatalogError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CatalogError::Unavailable("mock catalog offline".to_string()));
        }
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(CatalogSnapshot::new(
            self.blocks.read().await.clone(),
            self.versions.read().await.clone(),
        ))
    }
}

/// Distribution client that records every upload and sign-off request
#[derive(Default)]
pub struct RecordingDistribution {
    uploads: Mutex<Vec<(PublishMetadata, Attachment)>>,
    sign_offs: Mutex<Vec<SignOffStatus>>,
    failing: AtomicBool,
    failing_sign_off: AtomicBool,
}

impl RecordingDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn uploads(&self) -> Vec<(PublishMetadata, Attachment)> {
        self.uploads
            .lock()
            .map(|uploads| uploads.clone())
            .unwrap_or_default()
    }

    pub fn upload_count(&self) -> usize {
        self.uploads().len()
    }

    /// Make sign-off requests fail while uploads still succeed
    pub fn set_failing_sign_off(&self, failing: bool) {
        self.failing_sign_off.store(failing, Ordering::SeqCst);
    }

    pub fn sign_offs(&self) -> Vec<SignOffStatus> {
        self.sign_offs
            .lock()
            .map(|sign_offs| sign_offs.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DistributionClient for RecordingDistribution {
    async fn publish_attachment(
        &self,
        metadata: &PublishMetadata,
        attachment: Attachment,
    ) -> Result<(), PublishError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PublishError::Rejected {
                status: 503,
                body: "service unavailable".to_string(),
            });
        }
        if let Ok(mut uploads) = self.uploads.lock() {
            uploads.push((metadata.clone(), attachment));
        }
        Ok(())
    }

    async fn request_sign_off(&self, status: SignOffStatus) -> Result<(), PublishError> {
        if self.failing_sign_off.load(Ordering::SeqCst) {
            return Err(PublishError::Rejected {
                status: 403,
                body: "sign-off not allowed".to_string(),
            });
        }
        if let Ok(mut sign_offs) = self.sign_offs.lock() {
            sign_offs.push(status);
        }
        Ok(())
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct FixedClock {
    now: AtomicU64,
}

impl FixedClock {
    pub fn new(now: u64) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, millis: u64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Catalog with two blocked addons and a handful of clean versions
///
/// Blocked: `@guid2:1.0`, `@guid2:1.1`, `guid1@:1.0`.
pub fn sample_catalog(modified: u64) -> MockCatalog {
    let blocks = vec![
        BlockRecord::new("guid1@", vec![VersionRange::new("0", "1.0")], modified),
        BlockRecord::new("@guid2", vec![VersionRange::all()], modified),
    ];
    let mut versions = vec![
        CatalogVersion::new("guid1@", "1.0"),
        CatalogVersion::new("guid1@", "2.0"),
        CatalogVersion::new("@guid2", "1.0"),
        CatalogVersion::new("@guid2", "1.1"),
    ];
    versions.extend((0..200).map(|i| CatalogVersion::new(&format!("clean{}@", i), "1.0")));
    MockCatalog::new(blocks, versions)
}

/// Service wired to in-memory fakes, with handles to every fake
pub struct TestHarness {
    pub catalog: Arc<MockCatalog>,
    pub storage: Arc<InMemoryArtifactStorage>,
    pub config_store: Arc<InMemoryConfigStore>,
    pub distribution: Arc<RecordingDistribution>,
    pub clock: Arc<FixedClock>,
    pub service: GenerationService,
}

impl TestHarness {
    pub fn new(catalog: MockCatalog, now: u64) -> Self {
        Self::with_settings(catalog, now, GenerationSettings::default())
    }

    pub fn with_settings(catalog: MockCatalog, now: u64, settings: GenerationSettings) -> Self {
        let catalog = Arc::new(catalog);
        let storage = Arc::new(InMemoryArtifactStorage::new());
        let config_store = Arc::new(InMemoryConfigStore::new());
        let distribution = Arc::new(RecordingDistribution::new());
        let clock = Arc::new(FixedClock::new(now));

        let service = GenerationService::new(
            GenerationPorts {
                catalog: catalog.clone(),
                storage: storage.clone(),
                config_store: config_store.clone(),
                distribution: distribution.clone(),
                clock: clock.clone(),
                lock: Arc::new(NoopGenerationLock),
            },
            settings,
        );

        Self {
            catalog,
            storage,
            config_store,
            distribution,
            clock,
            service,
        }
    }
}
