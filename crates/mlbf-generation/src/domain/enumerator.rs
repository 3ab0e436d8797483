//! Identifier universe enumeration
//!
//! Splits the catalog's distributable versions into the blocked and
//! not-blocked identifier sets a generation is built from. Both come out
//! sorted and de-duplicated, so an unchanged catalog always yields the
//! same filter inputs.

use std::collections::{BTreeSet, HashMap};

use super::block::{BlockRecord, CatalogVersion};
use super::identifier::Identifier;

/// Blocked and not-blocked halves of the universe
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Universe {
    pub blocked: BTreeSet<Identifier>,
    pub not_blocked: BTreeSet<Identifier>,
}

impl Universe {
    pub fn len(&self) -> usize {
        self.blocked.len() + self.not_blocked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocked.is_empty() && self.not_blocked.is_empty()
    }

    /// Filter inputs in identifier order
    pub fn into_sorted_vecs(self) -> (Vec<Identifier>, Vec<Identifier>) {
        (
            self.blocked.into_iter().collect(),
            self.not_blocked.into_iter().collect(),
        )
    }
}

/// Partition the universe against the current block records
pub fn enumerate_universe(versions: &[CatalogVersion], blocks: &[BlockRecord]) -> Universe {
    let mut blocks_by_guid: HashMap<&str, Vec<&BlockRecord>> = HashMap::new();
    for block in blocks {
        blocks_by_guid.entry(block.guid.as_str()).or_default().push(block);
    }

    let mut universe = Universe::default();
    for row in versions.iter().filter(|row| row.in_universe()) {
        let id = Identifier::new(&row.guid, &row.version);
        let blocked = blocks_by_guid
            .get(row.guid.as_str())
            .map(|records| records.iter().any(|b| b.is_version_blocked(&row.version)))
            .unwrap_or(false);

        if blocked {
            universe.blocked.insert(id);
        } else {
            universe.not_blocked.insert(id);
        }
    }

    // The same identifier may appear in several catalog rows; once blocked
    // it stays blocked.
    let blocked = &universe.blocked;
    universe.not_blocked.retain(|id| !blocked.contains(id));
    universe
}

/// Identifiers for explicit `(guid, version)` pairs, sorted and de-duplicated
pub fn identifiers_from_pairs<'a>(
    pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> BTreeSet<Identifier> {
    pairs
        .into_iter()
        .map(|(guid, version)| Identifier::new(guid, version))
        .collect()
}
