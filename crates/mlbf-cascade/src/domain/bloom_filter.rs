//! Bloom filter layer
//!
//! INVARIANTS:
//! - FPR = (1 - e^(-kn/m))^k <= target_fpr for the sized element count
//! - No false negatives: if inserted, contains() MUST return true

use bitvec::prelude::*;

use super::hash_functions::KeyHasher;
use super::parameters::{calculate_fpr, calculate_optimal_parameters};

/// One fixed-size bit array of a cascade
///
/// A layer does not own its hasher: all layers of a cascade share the same
/// algorithm and salt and differ only by `depth`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BloomFilter {
    /// Bit array storing the filter state
    bits: BitVec<u8, Lsb0>,
    /// Number of hash functions (k)
    k: usize,
    /// Size in bits (m)
    m: usize,
    /// 1-based position in the cascade, mixed into every hash
    depth: u8,
}

impl BloomFilter {
    /// Create an empty layer with specified parameters
    ///
    /// # Arguments
    /// * `m` - Size in bits
    /// * `k` - Number of hash functions
    /// * `depth` - Layer depth
    pub fn new(m: usize, k: usize, depth: u8) -> Self {
        Self {
            bits: bitvec![u8, Lsb0; 0; m],
            k,
            m,
            depth,
        }
    }

    /// Create an empty layer with optimal parameters for target FPR
    pub fn new_with_fpr(expected_elements: usize, target_fpr: f64, depth: u8) -> Self {
        let params = calculate_optimal_parameters(expected_elements, target_fpr);
        Self::new(params.size_bits, params.hash_count, depth)
    }

    /// Rebuild a layer from its wire bytes
    ///
    /// `bytes` must hold exactly `ceil(m / 8)` bytes; trailing pad bits of
    /// the last byte are discarded.
    pub fn from_raw(bytes: Vec<u8>, m: usize, k: usize, depth: u8) -> Self {
        let mut bits = BitVec::<u8, Lsb0>::from_vec(bytes);
        bits.truncate(m);
        Self { bits, k, m, depth }
    }

    /// Insert an element into the layer
    ///
    /// After insertion, `contains(element)` is guaranteed to return true.
    pub fn insert(&mut self, hasher: &KeyHasher, element: &[u8]) {
        for pos in hasher.positions(self.depth, element, self.k, self.m) {
            self.bits.set(pos, true);
        }
    }

    /// Test if an element might be in the layer
    ///
    /// Returns:
    /// - `true` if the element might be in the set (could be false positive)
    /// - `false` if the element is definitely NOT in the set
    pub fn contains(&self, hasher: &KeyHasher, element: &[u8]) -> bool {
        hasher
            .positions(self.depth, element, self.k, self.m)
            .iter()
            .all(|&pos| self.bits[pos])
    }

    /// Expected false positive rate after inserting `n` elements
    ///
    /// Formula: FPR = (1 - e^(-kn/m))^k
    pub fn false_positive_rate(&self, n: usize) -> f64 {
        calculate_fpr(self.m, n, self.k)
    }

    /// Get the number of bits set in the layer
    pub fn bits_set(&self) -> usize {
        self.bits.count_ones()
    }

    /// Get the layer size in bits
    pub fn size_bits(&self) -> usize {
        self.m
    }

    /// Get the number of hash functions
    pub fn hash_count(&self) -> usize {
        self.k
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Backing bytes, LSB-first within each byte, zero padded
    pub fn as_raw_bytes(&self) -> &[u8] {
        self.bits.as_raw_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::hash_functions::HashAlgorithm;

    fn hasher() -> KeyHasher {
        KeyHasher::new(HashAlgorithm::Sha256, Vec::new())
    }

    #[test]
    fn test_bloom_filter_new_creates_valid_filter() {
        let filter = BloomFilter::new(1000, 7, 1);

        assert_eq!(filter.size_bits(), 1000);
        assert_eq!(filter.hash_count(), 7);
        assert_eq!(filter.bits_set(), 0, "All bits should be zero initially");
        assert_eq!(filter.as_raw_bytes().len(), 125);
    }

    #[test]
    fn test_bloom_filter_insert_sets_bits() {
        let hasher = hasher();
        let mut filter = BloomFilter::new(1000, 7, 1);

        filter.insert(&hasher, b"guid@:1.0");

        assert!(filter.bits_set() > 0);
        assert!(filter.bits_set() <= 7, "At most k=7 bits for one element");

        let bits_before = filter.bits_set();
        filter.insert(&hasher, b"guid@:1.0");
        assert_eq!(filter.bits_set(), bits_before, "Re-insert is idempotent");
    }

    #[test]
    fn test_bloom_filter_no_false_negatives_bulk() {
        let hasher = hasher();
        let mut filter = BloomFilter::new_with_fpr(1000, 0.01, 1);
        let elements: Vec<String> = (0..1000).map(|i| format!("guid{}@:1.0", i)).collect();

        for elem in &elements {
            filter.insert(&hasher, elem.as_bytes());
        }

        for elem in &elements {
            assert!(
                filter.contains(&hasher, elem.as_bytes()),
                "False negative for {}",
                elem
            );
        }
    }

    #[test]
    fn test_bloom_filter_false_positive_rate_bounded() {
        let hasher = KeyHasher::new(HashAlgorithm::Murmur3, Vec::new());
        let target_fpr = 0.01;
        let n = 100;
        let mut filter = BloomFilter::new_with_fpr(n, target_fpr, 1);

        for i in 0..n {
            filter.insert(&hasher, format!("inserted_{}", i).as_bytes());
        }

        let mut false_positives = 0;
        for i in 0..100_000 {
            if filter.contains(&hasher, format!("not_inserted_{}", i).as_bytes()) {
                false_positives += 1;
            }
        }

        let actual_fpr = false_positives as f64 / 100_000.0;
        assert!(
            actual_fpr <= target_fpr * 1.5,
            "Actual FPR {} exceeds 1.5 * target {}",
            actual_fpr,
            target_fpr
        );
        assert!(filter.false_positive_rate(n) <= target_fpr * 1.1);
    }

    #[test]
    fn test_raw_bytes_rebuild_identical_layer() {
        let hasher = hasher();
        let mut filter = BloomFilter::new(1001, 3, 2);
        for elem in ["a@b:1", "c@d:2", "e@f:3"] {
            filter.insert(&hasher, elem.as_bytes());
        }

        let rebuilt = BloomFilter::from_raw(filter.as_raw_bytes().to_vec(), 1001, 3, 2);
        assert_eq!(rebuilt, filter);
        assert!(rebuilt.contains(&hasher, b"c@d:2"));
    }

    #[test]
    fn test_depth_separates_layers() {
        let hasher = hasher();
        let mut layer1 = BloomFilter::new(4096, 4, 1);
        let mut layer2 = BloomFilter::new(4096, 4, 2);
        layer1.insert(&hasher, b"guid@:1.0");
        layer2.insert(&hasher, b"guid@:1.0");

        assert_ne!(layer1.as_raw_bytes(), layer2.as_raw_bytes());
    }
}
