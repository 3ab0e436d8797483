//! Domain Layer - Pure filter logic
//!
//! This layer contains:
//! - Bloom filter layers and their hash functions
//! - Parameter calculations
//! - Cascade configuration
//! - Cascade build, query and verification
//! - The binary wire format
//!
//! RULES:
//! - No I/O operations
//! - No async code

pub mod bloom_filter;
pub mod cascade;
pub mod config;
pub mod format;
pub mod hash_functions;
pub mod parameters;

pub use bloom_filter::BloomFilter;
pub use cascade::{FilterCascade, LayerRole};
pub use config::{CascadeConfig, CascadeConfigBuilder, DEFAULT_KEY_FORMAT_VERSION};
pub use format::{FORMAT_VERSION, MAGIC};
pub use hash_functions::{HashAlgorithm, KeyHasher};
pub use parameters::{calculate_optimal_parameters, derive_primary_fpr, BloomFilterParams};
