//! Hash functions for cascade layers
//!
//! Each layer derives its k bit positions by double hashing,
//! `h(i) = h1 + i * h2 (mod m)`, from a 128-bit digest of the salted key.
//! The layer depth is mixed into the digest so every layer hashes
//! independently of its neighbours.

use std::io::Cursor;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::CascadeError;

/// Digest used to derive bit positions. The discriminant is the wire value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// MurmurHash3 x64/128, seeded per function and tweaked by layer depth
    Murmur3 = 1,
    /// SHA-256 over `salt || depth || key`
    Sha256 = 2,
}

impl HashAlgorithm {
    /// Wire identifier written into the filter header
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for HashAlgorithm {
    type Error = CascadeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(HashAlgorithm::Murmur3),
            2 => Ok(HashAlgorithm::Sha256),
            other => Err(CascadeError::UnknownHashAlgorithm(other)),
        }
    }
}

/// Hash a salted element with MurmurHash3 using a seed and tweak
pub fn murmur_hash(salt: &[u8], element: &[u8], seed: u32, tweak: u32) -> u64 {
    let combined_seed = seed.wrapping_add(tweak.wrapping_shl(16));
    let mut input = Vec::with_capacity(salt.len() + element.len());
    input.extend_from_slice(salt);
    input.extend_from_slice(element);
    let mut reader = Cursor::new(input);

    // Use murmur3 128-bit hash and take the lower 64 bits
    let hash = murmur3::murmur3_x64_128(&mut reader, combined_seed).unwrap_or(0);
    hash as u64
}

/// SHA-256 of `salt || depth || element`, split into two 64-bit words
pub fn sha256_pair(salt: &[u8], element: &[u8], depth: u8) -> (u64, u64) {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update([depth]);
    hasher.update(element);
    let digest = hasher.finalize();

    let mut h1 = [0u8; 8];
    let mut h2 = [0u8; 8];
    h1.copy_from_slice(&digest[0..8]);
    h2.copy_from_slice(&digest[8..16]);
    (u64::from_le_bytes(h1), u64::from_le_bytes(h2))
}

/// Compute k bit positions for an element in the layer at `depth`
///
/// `h2` is forced odd so the probe sequence never collapses onto `h1`.
pub fn compute_hash_positions(
    algorithm: HashAlgorithm,
    salt: &[u8],
    depth: u8,
    element: &[u8],
    k: usize,
    m: usize,
) -> Vec<usize> {
    let (h1, h2) = match algorithm {
        HashAlgorithm::Murmur3 => (
            murmur_hash(salt, element, 0, depth as u32),
            murmur_hash(salt, element, 1, depth as u32),
        ),
        HashAlgorithm::Sha256 => sha256_pair(salt, element, depth),
    };
    let h2 = h2 | 1;

    (0..k)
        .map(|i| {
            let hash = h1.wrapping_add((i as u64).wrapping_mul(h2));
            (hash % m as u64) as usize
        })
        .collect()
}

/// Salted position generator shared by every layer of one cascade
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyHasher {
    algorithm: HashAlgorithm,
    salt: Vec<u8>,
}

impl KeyHasher {
    pub fn new(algorithm: HashAlgorithm, salt: impl Into<Vec<u8>>) -> Self {
        Self {
            algorithm,
            salt: salt.into(),
        }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    /// k positions for `element` in a layer of `m` bits at `depth`
    pub fn positions(&self, depth: u8, element: &[u8], k: usize, m: usize) -> Vec<usize> {
        compute_hash_positions(self.algorithm, &self.salt, depth, element, k, m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALGORITHMS: [HashAlgorithm; 2] = [HashAlgorithm::Murmur3, HashAlgorithm::Sha256];

    #[test]
    fn test_positions_deterministic() {
        for alg in ALGORITHMS {
            let a = compute_hash_positions(alg, b"salt", 1, b"guid@:1.0", 7, 10_000);
            let b = compute_hash_positions(alg, b"salt", 1, b"guid@:1.0", 7, 10_000);
            assert_eq!(a, b, "{:?} must be deterministic", alg);
        }
    }

    #[test]
    fn test_positions_within_bounds() {
        for alg in ALGORITHMS {
            let positions = compute_hash_positions(alg, b"", 3, b"foo@baa:999.223a", 13, 977);
            assert_eq!(positions.len(), 13);
            assert!(positions.iter().all(|&p| p < 977));
        }
    }

    #[test]
    fn test_depth_changes_positions() {
        for alg in ALGORITHMS {
            let layer1 = compute_hash_positions(alg, b"", 1, b"guid@:1.0", 7, 100_000);
            let layer2 = compute_hash_positions(alg, b"", 2, b"guid@:1.0", 7, 100_000);
            assert_ne!(layer1, layer2, "{:?}: layers must hash independently", alg);
        }
    }

    #[test]
    fn test_salt_changes_positions() {
        for alg in ALGORITHMS {
            let unsalted = compute_hash_positions(alg, b"", 1, b"guid@:1.0", 7, 100_000);
            let salted = compute_hash_positions(alg, b"pepper", 1, b"guid@:1.0", 7, 100_000);
            assert_ne!(unsalted, salted, "{:?}: salt must affect positions", alg);
        }
    }

    #[test]
    fn test_murmur_seed_and_tweak_are_independent() {
        let base = murmur_hash(b"", b"guid@:1.0", 0, 1);
        assert_ne!(base, murmur_hash(b"", b"guid@:1.0", 1, 1));
        assert_ne!(base, murmur_hash(b"", b"guid@:1.0", 0, 2));
    }

    #[test]
    fn test_algorithm_wire_roundtrip() {
        for alg in ALGORITHMS {
            assert_eq!(HashAlgorithm::try_from(alg.as_byte()).unwrap(), alg);
        }
        assert!(matches!(
            HashAlgorithm::try_from(9),
            Err(CascadeError::UnknownHashAlgorithm(9))
        ));
    }

    #[test]
    fn test_hash_uniformity() {
        let m = 1000;
        let k = 7;
        for alg in ALGORITHMS {
            let mut counts = vec![0usize; 10];
            for i in 0..1000 {
                let element = format!("guid{}@:1.{}", i, i % 7);
                for pos in compute_hash_positions(alg, b"", 1, element.as_bytes(), k, m) {
                    counts[pos / 100] += 1;
                }
            }

            // ~700 per bucket, allow 50% variance
            for (i, count) in counts.iter().enumerate() {
                assert!(
                    (350..=1050).contains(count),
                    "{:?}: bucket {} has {} entries",
                    alg,
                    i,
                    count
                );
            }
        }
    }
}
