//! Build statistics for a filter cascade
//!
//! Emitted once per build so operators can track how the filter grows
//! between generations.

use serde::{Deserialize, Serialize};

/// Sizes and rates of one cascade build
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CascadeStats {
    /// Keys encoded as blocked
    pub blocked_count: usize,
    /// Keys the cascade had to reject
    pub not_blocked_count: usize,
    /// `[primary, correction]` false positive rates used for sizing
    pub fprs: [f64; 2],
    /// Number of layers built
    pub layers: usize,
    /// Total bits across all layers
    pub bits: usize,
}

impl CascadeStats {
    /// Bits spent per blocked key
    pub fn bits_per_blocked(&self) -> f64 {
        if self.blocked_count == 0 {
            return 0.0;
        }
        self.bits as f64 / self.blocked_count as f64
    }
}
