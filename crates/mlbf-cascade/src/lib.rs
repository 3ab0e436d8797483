//! # MLBF Cascade
//!
//! Multi-level Bloom filter cascade for blocklist distribution.
//!
//! A cascade answers "is this key blocked?" for every key of a known
//! universe with no false negatives and no false positives, and with a
//! bounded false positive rate for keys outside that universe. Only the
//! error set of each layer is carried into the next, so the encoded size
//! stays close to what a single Bloom filter over the blocked keys costs.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): Pure logic, no I/O
//!   - `BloomFilter`: One fixed-size bit array
//!   - `FilterCascade`: Ordered layers with alternating roles
//!   - `CascadeConfig`: Sizing, hashing and ceilings
//!   - `format`: Self-describing binary encoding
//! - **Stats** (`stats`): Per-build sizes and rates
//!
//! ## Invariants
//!
//! - No false negatives: every blocked input tests blocked
//! - Exact on the build universe: every not-blocked input tests not blocked
//! - Deterministic: same inputs and config produce identical bytes
//!
//! ## Usage Example
//!
//! ```
//! use mlbf_cascade::{CascadeConfig, FilterCascade};
//!
//! let blocked = vec!["guid1@:1.0", "@guid2:1.1"];
//! let not_blocked = vec!["guid10@:1.0", "@guid20:1.0", "@guid20:1.1"];
//!
//! let (cascade, stats) =
//!     FilterCascade::build(&blocked, &not_blocked, &CascadeConfig::default())?;
//! assert!(cascade.contains("guid1@:1.0"));
//! assert!(!cascade.contains("guid10@:1.0"));
//! assert_eq!(stats.blocked_count, 2);
//!
//! let decoded = FilterCascade::from_bytes(&cascade.to_bytes())?;
//! assert!(decoded.contains("@guid2:1.1"));
//! # Ok::<(), mlbf_cascade::CascadeError>(())
//! ```

pub mod domain;
pub mod error;
pub mod stats;

// Re-exports for convenience
pub use domain::{
    BloomFilter, CascadeConfig, CascadeConfigBuilder, FilterCascade, HashAlgorithm, LayerRole,
    DEFAULT_KEY_FORMAT_VERSION, FORMAT_VERSION,
};
pub use error::CascadeError;
pub use stats::CascadeStats;
