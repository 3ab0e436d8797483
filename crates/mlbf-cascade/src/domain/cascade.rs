//! Multi-level Bloom filter cascade
//!
//! Layer 1 holds the blocked keys. Every later layer holds the keys that
//! slipped through the previous layer by accident: the false positives of
//! layer `d` (drawn from the set layer `d` had to reject) become the
//! inserted set of layer `d + 1`, and the set layer `d + 1` must reject is
//! everything layer `d` inserted. Building stops once a layer produces no
//! false positives, so the cascade answers exactly for every key it was
//! built from.
//!
//! INVARIANTS:
//! - Every blocked key tests blocked (no false negatives)
//! - Every not-blocked key the cascade was built from tests not blocked
//! - Same inputs and config ⇒ identical layers

use tracing::debug;

use super::bloom_filter::BloomFilter;
use super::config::CascadeConfig;
use super::hash_functions::{HashAlgorithm, KeyHasher};
use super::parameters::{calculate_optimal_parameters, derive_primary_fpr};
use crate::error::CascadeError;
use crate::stats::CascadeStats;

/// What presence in a layer means for the answer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerRole {
    /// Odd depth: presence keeps the key blocked
    Primary,
    /// Even depth: presence flips the key back to not blocked
    Correction,
}

impl LayerRole {
    pub fn for_depth(depth: u8) -> Self {
        if depth % 2 == 1 {
            LayerRole::Primary
        } else {
            LayerRole::Correction
        }
    }
}

/// Ordered layers plus the hashing parameters they share
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterCascade {
    layers: Vec<BloomFilter>,
    hasher: KeyHasher,
    key_format_version: u16,
}

impl FilterCascade {
    /// Assemble a cascade from decoded parts
    pub(crate) fn from_parts(
        layers: Vec<BloomFilter>,
        hasher: KeyHasher,
        key_format_version: u16,
    ) -> Self {
        Self {
            layers,
            hasher,
            key_format_version,
        }
    }

    /// Build a cascade that reports every `blocked` key as blocked and every
    /// `not_blocked` key as not blocked.
    ///
    /// The builder verifies its own output against both inputs before
    /// returning. Inputs are processed in the order given; pass sorted
    /// sequences for reproducible bytes.
    ///
    /// # Errors
    /// - `EmptyBlockedSet` when there is nothing to encode
    /// - `OverlappingInputs` when a key is on both sides
    /// - `TooManyLayers` / `LayerTooLarge` when the config ceilings are hit
    pub fn build<K: AsRef<[u8]>>(
        blocked: &[K],
        not_blocked: &[K],
        config: &CascadeConfig,
    ) -> Result<(Self, CascadeStats), CascadeError> {
        config.validate()?;

        if blocked.is_empty() {
            return Err(CascadeError::EmptyBlockedSet);
        }
        check_disjoint(blocked, not_blocked)?;

        let primary_fpr = config
            .primary_fpr
            .unwrap_or_else(|| derive_primary_fpr(blocked.len(), not_blocked.len()));
        let hasher = KeyHasher::new(config.hash_algorithm, config.salt.clone());

        let mut layers: Vec<BloomFilter> = Vec::new();
        let mut include: Vec<&[u8]> = blocked.iter().map(AsRef::as_ref).collect();
        let mut exclude: Vec<&[u8]> = not_blocked.iter().map(AsRef::as_ref).collect();

        loop {
            let depth = layers.len() + 1;
            if depth > config.max_layers {
                return Err(CascadeError::TooManyLayers {
                    layers: depth,
                    max: config.max_layers,
                });
            }

            let fpr = if depth == 1 {
                primary_fpr
            } else {
                config.correction_fpr
            };
            let params = calculate_optimal_parameters(include.len(), fpr);
            if params.size_bits > config.max_layer_bits {
                return Err(CascadeError::LayerTooLarge {
                    size_bits: params.size_bits,
                    max: config.max_layer_bits,
                });
            }
            let mut layer = BloomFilter::new(params.size_bits, params.hash_count, depth as u8);

            for key in &include {
                layer.insert(&hasher, key);
            }

            let false_positives: Vec<&[u8]> = exclude
                .iter()
                .copied()
                .filter(|key| layer.contains(&hasher, key))
                .collect();

            debug!(
                depth,
                inserted = include.len(),
                size_bits = layer.size_bits(),
                hash_count = layer.hash_count(),
                false_positives = false_positives.len(),
                "Built cascade layer"
            );
            layers.push(layer);

            if false_positives.is_empty() {
                break;
            }
            exclude = include;
            include = false_positives;
        }

        let cascade = Self {
            layers,
            hasher,
            key_format_version: config.key_format_version,
        };
        cascade.verify(blocked, not_blocked)?;

        let stats = CascadeStats {
            blocked_count: blocked.len(),
            not_blocked_count: not_blocked.len(),
            fprs: [primary_fpr, config.correction_fpr],
            layers: cascade.layer_count(),
            bits: cascade.bit_count(),
        };
        Ok((cascade, stats))
    }

    /// Membership query: `true` means blocked
    pub fn contains(&self, key: impl AsRef<[u8]>) -> bool {
        let key = key.as_ref();
        for layer in &self.layers {
            if !layer.contains(&self.hasher, key) {
                return LayerRole::for_depth(layer.depth()) == LayerRole::Correction;
            }
        }
        self.layers
            .last()
            .map(|layer| LayerRole::for_depth(layer.depth()) == LayerRole::Primary)
            .unwrap_or(false)
    }

    /// Check every input against the built layers
    pub fn verify<K: AsRef<[u8]>>(
        &self,
        blocked: &[K],
        not_blocked: &[K],
    ) -> Result<(), CascadeError> {
        let expectations = blocked
            .iter()
            .map(|key| (key, true))
            .chain(not_blocked.iter().map(|key| (key, false)));

        for (key, expected) in expectations {
            if self.contains(key) != expected {
                return Err(CascadeError::VerificationFailed {
                    key: String::from_utf8_lossy(key.as_ref()).into_owned(),
                    expected,
                });
            }
        }
        Ok(())
    }

    pub fn layers(&self) -> &[BloomFilter] {
        &self.layers
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Total bits across all layers
    pub fn bit_count(&self) -> usize {
        self.layers.iter().map(BloomFilter::size_bits).sum()
    }

    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hasher.algorithm()
    }

    pub fn salt(&self) -> &[u8] {
        self.hasher.salt()
    }

    pub fn key_format_version(&self) -> u16 {
        self.key_format_version
    }
}

/// Reject any key present on both sides
///
/// Sorted inputs are checked with a linear merge; anything else falls back
/// to a hash set.
fn check_disjoint<K: AsRef<[u8]>>(blocked: &[K], not_blocked: &[K]) -> Result<(), CascadeError> {
    let is_sorted = |keys: &[K]| keys.windows(2).all(|w| w[0].as_ref() <= w[1].as_ref());

    let overlap = if is_sorted(blocked) && is_sorted(not_blocked) {
        let (mut i, mut j) = (0, 0);
        let mut found = None;
        while i < blocked.len() && j < not_blocked.len() {
            let (a, b) = (blocked[i].as_ref(), not_blocked[j].as_ref());
            match a.cmp(b) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    found = Some(a);
                    break;
                }
            }
        }
        found
    } else {
        let blocked_set: std::collections::HashSet<&[u8]> =
            blocked.iter().map(AsRef::as_ref).collect();
        not_blocked
            .iter()
            .map(AsRef::as_ref)
            .find(|key| blocked_set.contains(key))
    };

    match overlap {
        Some(key) => Err(CascadeError::OverlappingInputs(
            String::from_utf8_lossy(key).into_owned(),
        )),
        None => Ok(()),
    }
}
