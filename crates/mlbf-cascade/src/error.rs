//! Error types for the filter cascade

use thiserror::Error;

/// Errors raised while configuring, building or decoding a filter cascade.
///
/// Every build error is an internal consistency fault: the caller must abort
/// the generation instead of publishing a degraded filter.
#[derive(Debug, Error)]
pub enum CascadeError {
    #[error("Blocked set is empty: nothing to encode")]
    EmptyBlockedSet,

    #[error("Identifier present in both blocked and not-blocked inputs: {0}")]
    OverlappingInputs(String),

    #[error("Cascade exceeded the layer ceiling: {layers} > {max}")]
    TooManyLayers { layers: usize, max: usize },

    #[error("Layer too large: {size_bits} bits > {max}")]
    LayerTooLarge { size_bits: usize, max: usize },

    #[error("Verification failed for {key}: expected blocked={expected}")]
    VerificationFailed { key: String, expected: bool },

    #[error("Invalid false positive rate: {fpr} (must be within ({min}, {max}])")]
    InvalidFpr { fpr: f64, min: f64, max: f64 },

    #[error("Invalid cascade parameters: {0}")]
    InvalidParameters(String),

    #[error("Unsupported format version: {0}")]
    UnsupportedVersion(u16),

    #[error("Unknown hash algorithm: {0}")]
    UnknownHashAlgorithm(u8),

    #[error("Malformed filter: {0}")]
    Malformed(String),
}
