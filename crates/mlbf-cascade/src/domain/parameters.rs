//! Optimal layer parameter calculation
//!
//! Formulas:
//! - m = -n*ln(fpr) / (ln(2)^2)  -- optimal bits
//! - k = (m/n) * ln(2)           -- optimal hash functions
//! - FPR = (1 - e^(-kn/m))^k

use std::f64::consts::{LN_2, SQRT_2};

/// Smallest primary rate the derived sizing will choose
pub const MIN_DERIVED_FPR: f64 = 1e-6;

/// Largest rate any layer may be sized for
pub const MAX_FPR: f64 = 0.5;

/// Upper bound on hash functions per layer (stored as a byte on the wire)
pub const MAX_HASH_COUNT: usize = 32;

/// Bloom layer parameters
#[derive(Clone, Debug, PartialEq)]
pub struct BloomFilterParams {
    /// Number of bits in the layer
    pub size_bits: usize,
    /// Number of hash functions
    pub hash_count: usize,
    /// Expected false positive rate with these parameters
    pub expected_fpr: f64,
}

/// Calculate optimal Bloom parameters for given constraints
///
/// # Arguments
/// * `num_elements` - Number of elements to insert (n)
/// * `target_fpr` - Target false positive rate
///
/// Layers are never smaller than one byte so the bit array always has a
/// backing byte on the wire.
pub fn calculate_optimal_parameters(num_elements: usize, target_fpr: f64) -> BloomFilterParams {
    if num_elements == 0 {
        return BloomFilterParams {
            size_bits: 8,
            hash_count: 1,
            expected_fpr: 0.0,
        };
    }

    let n = num_elements as f64;
    let ln2_squared = LN_2 * LN_2;

    let m = ((-n * target_fpr.ln() / ln2_squared).ceil() as usize).max(8);

    let k = ((m as f64 / n) * LN_2).round() as usize;
    let k = k.clamp(1, MAX_HASH_COUNT);

    let expected_fpr = calculate_fpr(m, num_elements, k);

    BloomFilterParams {
        size_bits: m,
        hash_count: k,
        expected_fpr,
    }
}

/// Calculate the false positive rate for given parameters
///
/// Formula: FPR = (1 - e^(-kn/m))^k
pub fn calculate_fpr(m: usize, n: usize, k: usize) -> f64 {
    if m == 0 {
        return 1.0;
    }
    let exponent = -(k as f64) * (n as f64) / (m as f64);
    (1.0 - exponent.exp()).powi(k as i32)
}

/// Primary-layer rate derived from the set sizes: `b / (sqrt(2) * nb)`
///
/// Keeps the first layer's expected false positives proportional to the
/// blocked count, which keeps the correction layers small. Clamped to
/// `[MIN_DERIVED_FPR, MAX_FPR]`; an empty not-blocked side needs no
/// precision at all.
pub fn derive_primary_fpr(blocked: usize, not_blocked: usize) -> f64 {
    if not_blocked == 0 {
        return MAX_FPR;
    }
    let fpr = blocked as f64 / (SQRT_2 * not_blocked as f64);
    fpr.clamp(MIN_DERIVED_FPR, MAX_FPR)
}
