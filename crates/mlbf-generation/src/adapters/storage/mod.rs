//! Artifact storage adapters

mod file;
mod memory;

pub use file::FileArtifactStorage;
pub use memory::InMemoryArtifactStorage;
