//! Inbound Ports (Driving Ports)

use std::path::PathBuf;

use async_trait::async_trait;
use mlbf_cascade::CascadeStats;

use crate::domain::{GenerationState, PublishGate};
use crate::error::GenerationError;

/// How a scheduled run ended
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// No block changed since the last generation
    UpToDate { state: GenerationState },
    /// Publishing is switched off and local builds were not requested
    PublishDisabled { state: GenerationState },
    /// Artifacts written, nothing pushed; the pointer did not move
    BuiltLocally {
        generation_time: u64,
        stash_written: bool,
        state: GenerationState,
    },
    /// Artifacts written, filter published, pointer advanced
    Published {
        generation_time: u64,
        stash_written: bool,
        stats: CascadeStats,
        state: GenerationState,
    },
}

impl Outcome {
    /// Generation pointer after the run
    pub fn state(&self) -> GenerationState {
        match self {
            Outcome::UpToDate { state }
            | Outcome::PublishDisabled { state }
            | Outcome::BuiltLocally { state, .. }
            | Outcome::Published { state, .. } => *state,
        }
    }
}

/// Explicit filter inputs for a local export
///
/// Each file holds a JSON array of `[guid, version]` pairs. Missing inputs
/// are taken from the catalog.
#[derive(Clone, Debug, Default)]
pub struct ExportInputs {
    pub blocked: Option<PathBuf>,
    pub not_blocked: Option<PathBuf>,
}

/// What a local export wrote
#[derive(Clone, Debug)]
pub struct ExportReport {
    pub id: String,
    pub stats: CascadeStats,
    pub filter_size: usize,
}

/// Generation pipeline API (Driving Port)
#[async_trait]
pub trait BlocklistGenerationApi: Send + Sync {
    /// One scheduled pipeline run
    ///
    /// # Errors
    /// Any fatal condition; the generation pointer is left untouched.
    async fn run(&self, gate: PublishGate) -> Result<Outcome, GenerationError>;

    /// Build and write artifacts under `id` without publishing or touching
    /// the generation pointer
    async fn export(&self, id: &str, inputs: &ExportInputs)
        -> Result<ExportReport, GenerationError>;
}
