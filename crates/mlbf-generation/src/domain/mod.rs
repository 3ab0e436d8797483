//! Domain layer: pure generation logic, no I/O

pub mod block;
pub mod enumerator;
pub mod generation;
pub mod identifier;
pub mod staleness;
pub mod stash;
pub mod version;

pub use block::{BlockRecord, CatalogSnapshot, CatalogVersion, VersionRange};
pub use enumerator::{enumerate_universe, identifiers_from_pairs, Universe};
pub use generation::{
    ArtifactLayout, Attachment, Generation, GenerationState, PublishGate, PublishMetadata,
    SignOffStatus, GENERATION_TIME_CONFIG_KEY,
};
pub use identifier::{Identifier, KEY_FORMAT};
pub use staleness::needs_new_generation;
pub use stash::Stash;
pub use version::{compare_versions, AddonVersion};
