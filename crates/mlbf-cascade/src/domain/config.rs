//! Cascade configuration and validation
//!
//! # Example
//!
//! ```
//! use mlbf_cascade::{CascadeConfigBuilder, HashAlgorithm};
//!
//! let config = CascadeConfigBuilder::new()
//!     .primary_fpr(0.01)
//!     .hash_algorithm(HashAlgorithm::Sha256)
//!     .salt(b"generation-salt".to_vec())
//!     .build()
//!     .expect("valid config");
//! assert_eq!(config.max_layers, 32);
//! ```

use serde::{Deserialize, Serialize};

use super::hash_functions::HashAlgorithm;
use super::parameters::MAX_FPR;
use crate::error::CascadeError;

/// Key encoding version understood by the default consumers
pub const DEFAULT_KEY_FORMAT_VERSION: u16 = 1;

/// Configuration for building a filter cascade
///
/// Two builds with the same configuration and the same inputs produce
/// byte-identical filters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CascadeConfig {
    /// Rate for the first (blocked) layer; `None` derives it from set sizes
    pub primary_fpr: Option<f64>,
    /// Rate for every subsequent layer
    pub correction_fpr: f64,
    /// Layer ceiling; exceeding it aborts the build
    pub max_layers: usize,
    /// Largest single layer in bits
    pub max_layer_bits: usize,
    /// Digest used for bit positions
    pub hash_algorithm: HashAlgorithm,
    /// Mixed into every hash; at most 255 bytes
    pub salt: Vec<u8>,
    /// Version of the caller's key encoding, recorded in the header
    pub key_format_version: u16,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            primary_fpr: None,
            correction_fpr: 0.5,
            max_layers: 32,
            max_layer_bits: u32::MAX as usize,
            hash_algorithm: HashAlgorithm::Sha256,
            salt: Vec::new(),
            key_format_version: DEFAULT_KEY_FORMAT_VERSION,
        }
    }
}

impl CascadeConfig {
    /// Validate rates, ceilings and salt length
    pub fn validate(&self) -> Result<(), CascadeError> {
        if let Some(fpr) = self.primary_fpr {
            check_fpr(fpr)?;
        }
        check_fpr(self.correction_fpr)?;

        if self.max_layers == 0 || self.max_layers > u8::MAX as usize {
            return Err(CascadeError::InvalidParameters(format!(
                "max_layers must be between 1 and {}",
                u8::MAX
            )));
        }

        if self.max_layer_bits == 0 || self.max_layer_bits > u32::MAX as usize {
            return Err(CascadeError::InvalidParameters(
                "max_layer_bits must fit in 32 bits and be non-zero".to_string(),
            ));
        }

        if self.salt.len() > u8::MAX as usize {
            return Err(CascadeError::InvalidParameters(format!(
                "salt is {} bytes, at most {} allowed",
                self.salt.len(),
                u8::MAX
            )));
        }

        Ok(())
    }

    /// Builder-style method to set the primary rate
    pub fn with_primary_fpr(mut self, fpr: f64) -> Self {
        self.primary_fpr = Some(fpr);
        self
    }

    /// Builder-style method to set the salt
    pub fn with_salt(mut self, salt: impl Into<Vec<u8>>) -> Self {
        self.salt = salt.into();
        self
    }
}

fn check_fpr(fpr: f64) -> Result<(), CascadeError> {
    if !(fpr > 0.0 && fpr <= MAX_FPR) {
        return Err(CascadeError::InvalidFpr {
            fpr,
            min: 0.0,
            max: MAX_FPR,
        });
    }
    Ok(())
}

/// Builder for CascadeConfig with validation
#[derive(Default)]
pub struct CascadeConfigBuilder {
    primary_fpr: Option<f64>,
    correction_fpr: Option<f64>,
    max_layers: Option<usize>,
    max_layer_bits: Option<usize>,
    hash_algorithm: Option<HashAlgorithm>,
    salt: Option<Vec<u8>>,
    key_format_version: Option<u16>,
}

impl CascadeConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the first-layer false positive rate
    pub fn primary_fpr(mut self, fpr: f64) -> Self {
        self.primary_fpr = Some(fpr);
        self
    }

    /// Set the correction-layer false positive rate
    pub fn correction_fpr(mut self, fpr: f64) -> Self {
        self.correction_fpr = Some(fpr);
        self
    }

    pub fn max_layers(mut self, layers: usize) -> Self {
        self.max_layers = Some(layers);
        self
    }

    pub fn max_layer_bits(mut self, bits: usize) -> Self {
        self.max_layer_bits = Some(bits);
        self
    }

    pub fn hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = Some(algorithm);
        self
    }

    pub fn salt(mut self, salt: Vec<u8>) -> Self {
        self.salt = Some(salt);
        self
    }

    pub fn key_format_version(mut self, version: u16) -> Self {
        self.key_format_version = Some(version);
        self
    }

    /// Build the CascadeConfig, validating all parameters
    pub fn build(self) -> Result<CascadeConfig, CascadeError> {
        let defaults = CascadeConfig::default();

        let config = CascadeConfig {
            primary_fpr: self.primary_fpr.or(defaults.primary_fpr),
            correction_fpr: self.correction_fpr.unwrap_or(defaults.correction_fpr),
            max_layers: self.max_layers.unwrap_or(defaults.max_layers),
            max_layer_bits: self.max_layer_bits.unwrap_or(defaults.max_layer_bits),
            hash_algorithm: self.hash_algorithm.unwrap_or(defaults.hash_algorithm),
            salt: self.salt.unwrap_or(defaults.salt),
            key_format_version: self
                .key_format_version
                .unwrap_or(defaults.key_format_version),
        };

        config.validate()?;
        Ok(config)
    }
}
