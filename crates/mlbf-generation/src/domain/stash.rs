//! Stash: the blocked-set diff between consecutive generations
//!
//! A client holding the previous blocked set applies the stash to reach
//! the current one without downloading the full filter.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::identifier::Identifier;

/// Identifiers newly blocked and newly unblocked since the previous generation
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stash {
    pub blocked: Vec<Identifier>,
    pub unblocked: Vec<Identifier>,
}

impl Stash {
    /// `blocked = current \ previous`, `unblocked = previous \ current`
    pub fn compute(previous: &BTreeSet<Identifier>, current: &BTreeSet<Identifier>) -> Self {
        Stash {
            blocked: current.difference(previous).cloned().collect(),
            unblocked: previous.difference(current).cloned().collect(),
        }
    }

    /// Reconstruct the current blocked set from the previous one
    pub fn apply(&self, previous: &BTreeSet<Identifier>) -> BTreeSet<Identifier> {
        let mut current = previous.clone();
        for id in &self.unblocked {
            current.remove(id);
        }
        current.extend(self.blocked.iter().cloned());
        current
    }

    pub fn is_empty(&self) -> bool {
        self.blocked.is_empty() && self.unblocked.is_empty()
    }
}
