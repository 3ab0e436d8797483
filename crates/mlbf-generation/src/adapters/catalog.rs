//! Catalog source backed by a JSON export of the block and version tables
//!
//! ```json
//! {
//!   "blocks": [
//!     {"guid": "bad@addon", "ranges": [{"min_version": "0", "max_version": "*"}], "modified": 1600000000000}
//!   ],
//!   "versions": [
//!     {"guid": "bad@addon", "version": "1.0", "signed": true, "distributable": true}
//!   ]
//! }
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::domain::CatalogSnapshot;
use crate::error::CatalogError;
use crate::ports::outbound::CatalogSource;

/// Reads the catalog file once per snapshot, so each run sees one export.
#[derive(Clone, Debug)]
pub struct JsonCatalogSource {
    path: PathBuf,
}

impl JsonCatalogSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl CatalogSource for JsonCatalogSource {
    async fn snapshot(&self) -> Result<CatalogSnapshot, CatalogError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| CatalogError::Io {
                path: self.path.clone(),
                source,
            })?;
        let catalog: CatalogSnapshot = serde_json::from_slice(&bytes)
            .map_err(|e| CatalogError::Malformed(format!("{}: {}", self.path.display(), e)))?;
        debug!(
            blocks = catalog.blocks.len(),
            versions = catalog.versions.len(),
            "[mlbf] Loaded catalog from {}",
            self.path.display()
        );
        Ok(catalog)
    }
}
