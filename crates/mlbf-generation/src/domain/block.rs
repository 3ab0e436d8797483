//! Block records and catalog rows, as read from the external store

use serde::{Deserialize, Serialize};

use super::version::AddonVersion;

/// Lowest version a range can start at
pub const MIN_VERSION: &str = "0";

/// Highest version a range can end at
pub const MAX_VERSION: &str = "*";

/// Inclusive version range covered by a block
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRange {
    #[serde(default = "default_min")]
    pub min_version: String,
    #[serde(default = "default_max")]
    pub max_version: String,
}

fn default_min() -> String {
    MIN_VERSION.to_string()
}

fn default_max() -> String {
    MAX_VERSION.to_string()
}

impl VersionRange {
    pub fn new(min_version: impl Into<String>, max_version: impl Into<String>) -> Self {
        Self {
            min_version: min_version.into(),
            max_version: max_version.into(),
        }
    }

    /// Range covering every version
    pub fn all() -> Self {
        Self::new(MIN_VERSION, MAX_VERSION)
    }

    pub fn is_all_versions(&self) -> bool {
        self.min_version == MIN_VERSION && self.max_version == MAX_VERSION
    }

    pub fn contains(&self, version: &str) -> bool {
        if self.is_all_versions() {
            return true;
        }
        let version = AddonVersion::parse(version);
        AddonVersion::parse(&self.min_version) <= version
            && version <= AddonVersion::parse(&self.max_version)
    }
}

impl Default for VersionRange {
    fn default() -> Self {
        Self::all()
    }
}

/// One block: a guid, the ranges it covers, and when it last changed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub guid: String,
    pub ranges: Vec<VersionRange>,
    /// Milliseconds since epoch
    pub modified: u64,
}

impl BlockRecord {
    pub fn new(guid: impl Into<String>, ranges: Vec<VersionRange>, modified: u64) -> Self {
        Self {
            guid: guid.into(),
            ranges,
            modified,
        }
    }

    pub fn is_version_blocked(&self, version: &str) -> bool {
        self.ranges.iter().any(|range| range.contains(version))
    }
}

/// One known addon version from the catalog
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogVersion {
    pub guid: String,
    pub version: String,
    #[serde(default = "default_true")]
    pub signed: bool,
    #[serde(default = "default_true")]
    pub distributable: bool,
}

fn default_true() -> bool {
    true
}

impl CatalogVersion {
    pub fn new(guid: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            version: version.into(),
            signed: true,
            distributable: true,
        }
    }

    /// Only signed, distributable versions can reach clients
    pub fn in_universe(&self) -> bool {
        self.signed && self.distributable
    }
}

/// Block records and catalog versions taken from one read of the store
///
/// A run decides staleness and builds from the same snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub blocks: Vec<BlockRecord>,
    #[serde(default)]
    pub versions: Vec<CatalogVersion>,
}

impl CatalogSnapshot {
    pub fn new(blocks: Vec<BlockRecord>, versions: Vec<CatalogVersion>) -> Self {
        Self { blocks, versions }
    }

    /// Most recent `modified` across all block records
    pub fn latest_block_modified(&self) -> Option<u64> {
        self.blocks.iter().map(|block| block.modified).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_edges_are_inclusive() {
        let range = VersionRange::new("1.0", "2.0");
        assert!(range.contains("1.0"));
        assert!(range.contains("1.0.0"));
        assert!(range.contains("2.0"));
        assert!(range.contains("1.5b2"));
        assert!(!range.contains("0.9"));
        assert!(!range.contains("2.0.1"));
        assert!(!range.contains("1.0pre1"));
    }

    #[test]
    fn test_all_versions_range() {
        let range = VersionRange::all();
        assert!(range.is_all_versions());
        assert!(range.contains("anything-goes"));
        assert!(range.contains("0"));
    }

    #[test]
    fn test_record_checks_every_range() {
        let record = BlockRecord::new(
            "a@b",
            vec![VersionRange::new("1.0", "1.0"), VersionRange::new("3.0", "*")],
            10,
        );
        assert!(record.is_version_blocked("1.0"));
        assert!(!record.is_version_blocked("2.0"));
        assert!(record.is_version_blocked("45.1"));
    }

    #[test]
    fn test_range_defaults_when_deserialized() {
        let range: VersionRange = serde_json::from_str(r#"{"max_version": "2.0"}"#).unwrap();
        assert_eq!(range.min_version, MIN_VERSION);
        assert_eq!(range.max_version, "2.0");
    }

    #[test]
    fn test_snapshot_latest_block_modified() {
        let snapshot = CatalogSnapshot::new(
            vec![
                BlockRecord::new("a@", vec![VersionRange::all()], 30),
                BlockRecord::new("b@", vec![VersionRange::all()], 70),
            ],
            vec![],
        );
        assert_eq!(snapshot.latest_block_modified(), Some(70));
        assert_eq!(CatalogSnapshot::default().latest_block_modified(), None);
    }
}
