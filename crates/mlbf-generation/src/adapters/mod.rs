//! Adapters Layer
//!
//! Implementations of the outbound ports for production and tests.

pub mod catalog;
pub mod config_store;
pub mod distribution;
pub mod lock;
pub mod storage;
pub mod time;

pub use catalog::JsonCatalogSource;
pub use config_store::{InMemoryConfigStore, JsonFileConfigStore};
pub use distribution::HttpDistributionClient;
pub use lock::{FileGenerationLock, NoopGenerationLock};
pub use storage::{FileArtifactStorage, InMemoryArtifactStorage};
pub use time::SystemClock;
