//! Error types for the generation pipeline

use std::path::PathBuf;

use mlbf_cascade::CascadeError;
use thiserror::Error;

/// Failure of one pipeline run
///
/// Every variant is fatal for the run; none of them advance the last
/// generation pointer.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Another run holds the pipeline lock
    #[error("Generation already running: {0}")]
    Locked(#[from] LockError),

    /// Catalog or block records could not be read
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Building or verifying the cascade failed
    #[error("Cascade build failed: {0}")]
    Cascade(#[from] CascadeError),

    /// Writing an artifact failed
    #[error("Artifact storage error: {0}")]
    Storage(#[from] StorageError),

    /// Reading or writing the generation pointer failed
    #[error("Config store error: {0}")]
    ConfigStore(#[from] ConfigStoreError),

    /// Remote publish failed
    #[error("Publish failed: {0}")]
    Publish(#[from] PublishError),

    /// The clock has not moved past the last published generation, so a
    /// new generation would reuse or predate its time
    #[error("Clock at {generation_time} is not after the last generation {last}")]
    ClockBehind { generation_time: u64, last: u64 },

    /// Explicit export inputs could not be read
    #[error("Invalid export input {}: {reason}", .path.display())]
    InvalidInput { path: PathBuf, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Catalog source errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed catalog: {0}")]
    Malformed(String),

    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}

/// Artifact storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error at {path}: {message}")]
    Io { path: String, message: String },

    #[error("Invalid artifact path: {0}")]
    InvalidPath(String),
}

/// Config store errors
#[derive(Debug, Error)]
pub enum ConfigStoreError {
    #[error("I/O error at {}: {message}", .path.display())]
    Io { path: PathBuf, message: String },

    #[error("Corrupt config store: {0}")]
    Corrupt(String),

    #[error("Unexpected value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Distribution service errors
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Distribution service rejected upload with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Distribution service unavailable: {0}")]
    Unavailable(String),
}

/// Pipeline lock errors
#[derive(Debug, Error)]
pub enum LockError {
    #[error("Failed to create lock file {}: {source}", .path.display())]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Lock {} already held (owner pid: {pid:?})", .path.display())]
    AlreadyLocked { pid: Option<u32>, path: PathBuf },

    #[error("Failed to write PID to lock file: {0}")]
    WriteFailed(std::io::Error),
}
