//! Generations and the artifacts they leave behind

use mlbf_cascade::CascadeStats;
use serde::{Deserialize, Serialize};

use super::identifier::{Identifier, KEY_FORMAT};
use super::stash::Stash;

/// Config store key holding the last published generation time
pub const GENERATION_TIME_CONFIG_KEY: &str = "blocklist_mlbf_generation_time";

/// File name of the published filter attachment
pub const ATTACHMENT_FILENAME: &str = "filter.bin";

/// Content type of the published filter attachment
pub const ATTACHMENT_CONTENT_TYPE: &str = "application/octet-stream";

/// The only piece of mutable state the pipeline owns
///
/// Loaded once per run and handed back, advanced or not, when the run ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GenerationState {
    pub last_generation_time: Option<u64>,
}

impl GenerationState {
    pub fn new(last_generation_time: Option<u64>) -> Self {
        Self {
            last_generation_time,
        }
    }

    /// State after `generation_time` was confirmed published
    ///
    /// The pointer never moves backwards.
    pub fn advance(self, generation_time: u64) -> Self {
        let next = match self.last_generation_time {
            Some(previous) => previous.max(generation_time),
            None => generation_time,
        };
        Self::new(Some(next))
    }
}

/// Storage paths for one generation, keyed by its id
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactLayout {
    id: String,
}

impl ArtifactLayout {
    pub fn new(id: impl ToString) -> Self {
        Self { id: id.to_string() }
    }

    pub fn filter_path(&self) -> String {
        format!("{}/filter", self.id)
    }

    pub fn blocked_path(&self) -> String {
        format!("{}/blocked.json", self.id)
    }

    pub fn not_blocked_path(&self) -> String {
        format!("{}/notblocked.json", self.id)
    }

    pub fn stash_path(&self) -> String {
        format!("{}/stash.json", self.id)
    }
}

/// One immutable build of filter, snapshots, and optional stash
#[derive(Clone, Debug)]
pub struct Generation {
    pub generation_time: u64,
    pub filter_bytes: Vec<u8>,
    pub blocked_snapshot: Vec<Identifier>,
    pub not_blocked_snapshot: Vec<Identifier>,
    pub stash: Option<Stash>,
    pub stats: CascadeStats,
}

impl Generation {
    pub fn layout(&self) -> ArtifactLayout {
        ArtifactLayout::new(self.generation_time)
    }
}

/// Metadata published alongside the filter
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishMetadata {
    pub key_format: String,
    pub key_format_version: u16,
    pub generation_time: u64,
}

impl PublishMetadata {
    pub fn new(key_format_version: u16, generation_time: u64) -> Self {
        Self {
            key_format: KEY_FORMAT.to_string(),
            key_format_version,
            generation_time,
        }
    }
}

/// Opaque file pushed to the distribution service
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content: Vec<u8>,
    pub content_type: String,
}

impl Attachment {
    pub fn filter(content: Vec<u8>) -> Self {
        Self {
            filename: ATTACHMENT_FILENAME.to_string(),
            content,
            content_type: ATTACHMENT_CONTENT_TYPE.to_string(),
        }
    }
}

/// Whether this run may push to the distribution service
///
/// Resolved from the feature flag once, before the pipeline starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PublishGate {
    Enabled,
    Disabled,
}

impl PublishGate {
    pub fn from_flag(enabled: bool) -> Self {
        if enabled {
            PublishGate::Enabled
        } else {
            PublishGate::Disabled
        }
    }

    pub fn is_enabled(self) -> bool {
        self == PublishGate::Enabled
    }
}

/// Review state requested from the distribution service once a filter is uploaded
///
/// A signer-backed collection only releases uploads to clients after this
/// request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignOffStatus {
    /// A human reviewer must approve before signing
    ToReview,
    /// Sign and release right away
    #[default]
    ToSign,
}

impl SignOffStatus {
    pub fn from_sign_off_needed(sign_off_needed: bool) -> Self {
        if sign_off_needed {
            SignOffStatus::ToReview
        } else {
            SignOffStatus::ToSign
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SignOffStatus::ToReview => "to-review",
            SignOffStatus::ToSign => "to-sign",
        }
    }
}
