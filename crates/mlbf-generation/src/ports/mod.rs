//! Ports Layer
//!
//! - Driving port (inbound): what the scheduler and CLI call
//! - Driven ports (outbound): catalog, storage, config store, distribution
//!   service, clock, and pipeline lock

pub mod inbound;
pub mod outbound;

pub use inbound::{BlocklistGenerationApi, ExportInputs, ExportReport, Outcome};
pub use outbound::{
    ArtifactStorage, CatalogSource, Clock, ConfigStore, DistributionClient, GenerationLock,
    LockGuard,
};
