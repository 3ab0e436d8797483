//! Generation Service
//!
//! Orchestrates one pipeline run: staleness check, universe enumeration,
//! cascade build, artifact writes, stash, remote publish, and finally the
//! generation pointer update.
//!
//! ## Ordering
//!
//! Nothing remote happens until every local artifact is written, and the
//! pointer only moves after the distribution service accepted the filter
//! and the sign-off request. A failed run leaves the pointer where it was,
//! so the next scheduled run retries with a fresh generation time.
//!
//! Staleness and the build read the same catalog snapshot. A generation
//! time at or before the last one is refused before anything is written,
//! since generation directories are never rewritten.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use mlbf_cascade::{CascadeConfig, CascadeStats, FilterCascade};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::GenerationConfig;
use crate::domain::{
    enumerate_universe, identifiers_from_pairs, needs_new_generation, ArtifactLayout, Attachment,
    CatalogSnapshot, Generation, GenerationState, Identifier, PublishGate, PublishMetadata,
    SignOffStatus, Stash, GENERATION_TIME_CONFIG_KEY,
};
use crate::error::{ConfigStoreError, GenerationError};
use crate::ports::outbound::{
    ArtifactStorage, CatalogSource, Clock, ConfigStore, DistributionClient, GenerationLock,
};
use crate::ports::{BlocklistGenerationApi, ExportInputs, ExportReport, Outcome};

/// Driven ports the service runs against
pub struct GenerationPorts {
    pub catalog: Arc<dyn CatalogSource>,
    pub storage: Arc<dyn ArtifactStorage>,
    pub config_store: Arc<dyn ConfigStore>,
    pub distribution: Arc<dyn DistributionClient>,
    pub clock: Arc<dyn Clock>,
    pub lock: Arc<dyn GenerationLock>,
}

/// Behavior switches for the service
#[derive(Clone, Debug)]
pub struct GenerationSettings {
    pub cascade: CascadeConfig,
    /// Build local artifacts when the publish gate is closed
    pub build_when_disabled: bool,
    /// Status requested from the distribution service after an upload
    pub sign_off_status: SignOffStatus,
    /// Config store key holding the last generation time
    pub generation_time_key: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            cascade: CascadeConfig::default(),
            build_when_disabled: false,
            sign_off_status: SignOffStatus::default(),
            generation_time_key: GENERATION_TIME_CONFIG_KEY.to_string(),
        }
    }
}

impl From<&GenerationConfig> for GenerationSettings {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            cascade: config.cascade.clone(),
            build_when_disabled: config.build_when_disabled,
            sign_off_status: SignOffStatus::from_sign_off_needed(config.sign_off_needed),
            generation_time_key: config.generation_time_key.clone(),
        }
    }
}

/// Generation Service implementation
///
/// Implements the `BlocklistGenerationApi` port using injected dependencies.
pub struct GenerationService {
    ports: GenerationPorts,
    settings: GenerationSettings,
}

impl GenerationService {
    pub fn new(ports: GenerationPorts, settings: GenerationSettings) -> Self {
        Self { ports, settings }
    }

    /// Read the generation pointer
    ///
    /// An absent key, `null`, or `0` all mean no generation was published.
    pub fn load_state(&self) -> Result<GenerationState, GenerationError> {
        let key = &self.settings.generation_time_key;
        let last = match self.ports.config_store.get(key)? {
            None | Some(Value::Null) => None,
            Some(value) => match value.as_u64() {
                Some(0) => None,
                Some(time) => Some(time),
                None => {
                    return Err(ConfigStoreError::InvalidValue {
                        key: key.clone(),
                        value: value.to_string(),
                    }
                    .into())
                }
            },
        };
        Ok(GenerationState::new(last))
    }

    /// Blocked snapshot of an earlier generation
    ///
    /// Missing or unreadable snapshots yield `None`; a stash is then simply
    /// not produced.
    pub fn load_blocked_snapshot(&self, generation_time: u64) -> Option<BTreeSet<Identifier>> {
        let path = ArtifactLayout::new(generation_time).blocked_path();
        let bytes = match self.ports.storage.read(&path) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                info!("[mlbf] No previous blocked snapshot at {}; skipping stash", path);
                return None;
            }
            Err(e) => {
                warn!("[mlbf] Could not read previous blocked snapshot {}: {}", path, e);
                return None;
            }
        };
        match serde_json::from_slice::<Vec<Identifier>>(&bytes) {
            Ok(ids) => Some(ids.into_iter().collect()),
            Err(e) => {
                warn!("[mlbf] Corrupt previous blocked snapshot {}: {}", path, e);
                None
            }
        }
    }

    /// Enumerate the universe and build the cascade for it
    fn build_generation(
        &self,
        catalog: &CatalogSnapshot,
        generation_time: u64,
        state: GenerationState,
    ) -> Result<Generation, GenerationError> {
        let universe = enumerate_universe(&catalog.versions, &catalog.blocks);
        debug!(
            blocked = universe.blocked.len(),
            not_blocked = universe.not_blocked.len(),
            "[mlbf] Enumerated identifier universe"
        );

        let current = universe.blocked.clone();
        let (blocked, not_blocked) = universe.into_sorted_vecs();

        info!(generation_time, "[mlbf] Generating filter");
        let (cascade, stats) = FilterCascade::build(&blocked, &not_blocked, &self.settings.cascade)?;
        let filter_bytes = cascade.to_bytes();
        log_stats(&stats, filter_bytes.len());

        let stash = state
            .last_generation_time
            .and_then(|previous| self.load_blocked_snapshot(previous))
            .map(|previous| Stash::compute(&previous, &current));

        Ok(Generation {
            generation_time,
            filter_bytes,
            blocked_snapshot: blocked,
            not_blocked_snapshot: not_blocked,
            stash,
            stats,
        })
    }

    /// Persist filter, snapshots, and stash for a generation
    fn write_generation(&self, generation: &Generation) -> Result<(), GenerationError> {
        let layout = generation.layout();
        self.write_artifacts(
            &layout,
            &generation.filter_bytes,
            &generation.blocked_snapshot,
            &generation.not_blocked_snapshot,
        )?;

        if let Some(stash) = &generation.stash {
            let path = layout.stash_path();
            info!(
                blocked = stash.blocked.len(),
                unblocked = stash.unblocked.len(),
                "[mlbf] Writing stash to {}",
                path
            );
            self.ports
                .storage
                .write(&path, &serde_json::to_vec(stash)?)?;
        }
        Ok(())
    }

    fn write_artifacts(
        &self,
        layout: &ArtifactLayout,
        filter_bytes: &[u8],
        blocked: &[Identifier],
        not_blocked: &[Identifier],
    ) -> Result<(), GenerationError> {
        let storage = &self.ports.storage;

        let path = layout.filter_path();
        info!("[mlbf] Writing filter to {}", path);
        storage.write(&path, filter_bytes)?;

        let path = layout.blocked_path();
        info!("[mlbf] Writing blocked snapshot to {}", path);
        storage.write(&path, &serde_json::to_vec(blocked)?)?;

        let path = layout.not_blocked_path();
        info!("[mlbf] Writing not-blocked snapshot to {}", path);
        storage.write(&path, &serde_json::to_vec(not_blocked)?)?;
        Ok(())
    }

    async fn read_pairs(path: &Path) -> Result<BTreeSet<Identifier>, GenerationError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| GenerationError::InvalidInput {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        let pairs: Vec<(String, String)> =
            serde_json::from_slice(&bytes).map_err(|e| GenerationError::InvalidInput {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        Ok(identifiers_from_pairs(
            pairs.iter().map(|(guid, version)| (guid.as_str(), version.as_str())),
        ))
    }
}

/// One JSON line per build, for dashboards that scrape logs
fn log_stats(stats: &CascadeStats, filter_size: usize) {
    let line = json!({
        "mlbf_blocked_count": stats.blocked_count,
        "mlbf_notblocked_count": stats.not_blocked_count,
        "mlbf_fprs": stats.fprs,
        "mlbf_layers": stats.layers,
        "mlbf_bits": stats.bits,
        "mlbf_filesize": filter_size,
    });
    info!("[mlbf] {}", line);
}

#[async_trait]
impl BlocklistGenerationApi for GenerationService {
    async fn run(&self, gate: PublishGate) -> Result<Outcome, GenerationError> {
        let _guard = self.ports.lock.try_acquire()?;

        let state = self.load_state()?;
        let catalog = self.ports.catalog.snapshot().await?;
        let latest_block = catalog.latest_block_modified();
        if !needs_new_generation(state.last_generation_time, latest_block) {
            info!(
                last_generation_time = ?state.last_generation_time,
                latest_block = ?latest_block,
                "[mlbf] No new or modified blocks; skipping generation"
            );
            return Ok(Outcome::UpToDate { state });
        }

        if !gate.is_enabled() && !self.settings.build_when_disabled {
            info!("[mlbf] Filter publishing disabled; skipping generation");
            return Ok(Outcome::PublishDisabled { state });
        }

        let generation_time = self.ports.clock.now_millis();
        if let Some(last) = state.last_generation_time {
            if generation_time <= last {
                warn!(
                    generation_time,
                    last_generation_time = last,
                    "[mlbf] Clock is not past the last generation; refusing to overwrite it"
                );
                return Err(GenerationError::ClockBehind {
                    generation_time,
                    last,
                });
            }
        }

        let generation = self.build_generation(&catalog, generation_time, state)?;
        self.write_generation(&generation)?;
        let stash_written = generation.stash.is_some();

        if !gate.is_enabled() {
            info!(generation_time, "[mlbf] Built filter locally; publishing disabled");
            return Ok(Outcome::BuiltLocally {
                generation_time,
                stash_written,
                state,
            });
        }

        let metadata =
            PublishMetadata::new(self.settings.cascade.key_format_version, generation_time);
        let Generation {
            filter_bytes, stats, ..
        } = generation;
        self.ports
            .distribution
            .publish_attachment(&metadata, Attachment::filter(filter_bytes))
            .await?;
        self.ports
            .distribution
            .request_sign_off(self.settings.sign_off_status)
            .await?;

        let next = state.advance(generation_time);
        self.ports
            .config_store
            .set(&self.settings.generation_time_key, json!(generation_time))?;
        info!(generation_time, "[mlbf] Published filter generation");

        Ok(Outcome::Published {
            generation_time,
            stash_written,
            stats,
            state: next,
        })
    }

    async fn export(&self, id: &str, inputs: &ExportInputs) -> Result<ExportReport, GenerationError> {
        let explicit_blocked = match &inputs.blocked {
            Some(path) => Some(Self::read_pairs(path).await?),
            None => None,
        };
        let explicit_not_blocked = match &inputs.not_blocked {
            Some(path) => Some(Self::read_pairs(path).await?),
            None => None,
        };

        let (blocked, not_blocked) = match (explicit_blocked, explicit_not_blocked) {
            (Some(blocked), Some(not_blocked)) => (blocked, not_blocked),
            (blocked, not_blocked) => {
                let catalog = self.ports.catalog.snapshot().await?;
                let universe = enumerate_universe(&catalog.versions, &catalog.blocks);
                let blocked = blocked.unwrap_or_else(|| universe.blocked.clone());
                let not_blocked = not_blocked.unwrap_or_else(|| {
                    universe
                        .blocked
                        .into_iter()
                        .chain(universe.not_blocked)
                        .filter(|id| !blocked.contains(id))
                        .collect()
                });
                (blocked, not_blocked)
            }
        };

        let blocked: Vec<Identifier> = blocked.into_iter().collect();
        let not_blocked: Vec<Identifier> = not_blocked.into_iter().collect();
        let (cascade, stats) = FilterCascade::build(&blocked, &not_blocked, &self.settings.cascade)?;
        let filter_bytes = cascade.to_bytes();
        log_stats(&stats, filter_bytes.len());

        self.write_artifacts(&ArtifactLayout::new(id), &filter_bytes, &blocked, &not_blocked)?;
        info!(id, "[mlbf] Exported filter");

        Ok(ExportReport {
            id: id.to_string(),
            stats,
            filter_size: filter_bytes.len(),
        })
    }
}
