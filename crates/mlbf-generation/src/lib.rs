//! # MLBF Generation
//!
//! Builds, stores, and publishes generations of the addon blocklist filter.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): Pure logic, no I/O
//!   - `enumerate_universe`: splits catalog versions into blocked / not blocked
//!   - `AddonVersion`: addon toolkit version ordering for block ranges
//!   - `needs_new_generation`: staleness decision
//!   - `Stash`: blocked-set diff between consecutive generations
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `BlocklistGenerationApi`: Driving port (scheduled run, local export)
//!   - `CatalogSource`, `ArtifactStorage`, `ConfigStore`,
//!     `DistributionClient`, `Clock`, `GenerationLock`: Driven ports
//!
//! - **Service Layer** (`service/`): Orchestration
//!   - `GenerationService`: Implements `BlocklistGenerationApi`
//!
//! - **Adapters Layer** (`adapters/`): Filesystem, JSON, HTTP, and fs2
//!   implementations of the driven ports, plus in-memory variants
//!
//! ## Invariants
//!
//! - Every blocked identifier tests blocked in the published filter
//! - Blocked and not-blocked snapshots are disjoint and cover the universe
//! - The generation pointer moves only after a successful publish and
//!   sign-off request, and only forwards
//! - A generation directory is written by exactly one run
//!
//! ## Usage Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use mlbf_generation::adapters::*;
//! use mlbf_generation::{
//!     BlocklistGenerationApi, GenerationPorts, GenerationService, GenerationSettings, PublishGate,
//! };
//!
//! let service = GenerationService::new(
//!     GenerationPorts {
//!         catalog: Arc::new(JsonCatalogSource::new("catalog.json")),
//!         storage: Arc::new(FileArtifactStorage::new("artifacts")),
//!         config_store: Arc::new(JsonFileConfigStore::new("config.json")),
//!         distribution: Arc::new(HttpDistributionClient::new(url, timeout)?),
//!         clock: Arc::new(SystemClock),
//!         lock: Arc::new(FileGenerationLock::new(".")),
//!     },
//!     GenerationSettings::default(),
//! );
//! let outcome = service.run(PublishGate::Enabled).await?;
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::GenerationConfig;
pub use domain::{
    enumerate_universe, needs_new_generation, BlockRecord, CatalogSnapshot, CatalogVersion,
    GenerationState, Identifier, PublishGate, SignOffStatus, Stash, VersionRange,
};
pub use error::{
    CatalogError, ConfigStoreError, GenerationError, LockError, PublishError, StorageError,
};
pub use ports::{BlocklistGenerationApi, ExportInputs, ExportReport, Outcome};
pub use service::{GenerationPorts, GenerationService, GenerationSettings};
