//! Runtime configuration for the generation pipeline
//!
//! Defaults suit a local checkout; production overrides come from `MLBF_*`
//! environment variables.

use std::path::PathBuf;

use mlbf_cascade::{CascadeConfig, HashAlgorithm};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::GENERATION_TIME_CONFIG_KEY;

/// Pipeline configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Root directory for generation artifacts
    pub storage_root: PathBuf,
    /// JSON file backing the config store
    pub config_store_path: PathBuf,
    /// Directory holding the pipeline lock file
    pub lock_dir: PathBuf,
    /// JSON catalog export read by the file catalog source
    pub catalog_path: PathBuf,
    /// Distribution collection URL, e.g. `https://host/v1/buckets/b/collections/c`
    pub distribution_url: String,
    /// Record the filter attachment is uploaded to
    pub distribution_record_id: Option<String>,
    /// Bearer token for the distribution service
    pub distribution_token: Option<String>,
    /// Request timeout for the distribution service, in seconds
    pub distribution_timeout_secs: u64,
    /// Remote-publish feature flag
    pub publish_enabled: bool,
    /// Build and write local artifacts even when publishing is disabled
    pub build_when_disabled: bool,
    /// Request human review after an upload instead of immediate signing
    pub sign_off_needed: bool,
    /// Config store key for the last generation time
    pub generation_time_key: String,
    pub cascade: CascadeConfig,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("./mlbf-data/artifacts"),
            config_store_path: PathBuf::from("./mlbf-data/config.json"),
            lock_dir: PathBuf::from("./mlbf-data"),
            catalog_path: PathBuf::from("./mlbf-data/catalog.json"),
            distribution_url: "http://127.0.0.1:8888/v1/buckets/blocklists/collections/addons-bloomfilters"
                .to_string(),
            distribution_record_id: None,
            distribution_token: None,
            distribution_timeout_secs: 30,
            publish_enabled: false,
            build_when_disabled: false,
            sign_off_needed: false,
            generation_time_key: GENERATION_TIME_CONFIG_KEY.to_string(),
            cascade: CascadeConfig::default(),
        }
    }
}

impl GenerationConfig {
    /// Defaults overridden by `MLBF_*` environment variables
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Overrides read through `lookup` instead of the process environment
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(dir) = lookup("MLBF_STORAGE_ROOT") {
            config.storage_root = PathBuf::from(dir);
        }
        if let Some(path) = lookup("MLBF_CONFIG_STORE") {
            config.config_store_path = PathBuf::from(path);
        }
        if let Some(dir) = lookup("MLBF_LOCK_DIR") {
            config.lock_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup("MLBF_CATALOG") {
            config.catalog_path = PathBuf::from(path);
        }
        if let Some(url) = lookup("MLBF_DISTRIBUTION_URL") {
            config.distribution_url = url;
        }
        if let Some(id) = lookup("MLBF_DISTRIBUTION_RECORD_ID") {
            config.distribution_record_id = Some(id);
        }
        if let Some(token) = lookup("MLBF_DISTRIBUTION_TOKEN") {
            config.distribution_token = Some(token);
        }
        if let Some(secs) = lookup("MLBF_DISTRIBUTION_TIMEOUT_SECS") {
            match secs.parse() {
                Ok(secs) => config.distribution_timeout_secs = secs,
                Err(_) => warn!("MLBF_DISTRIBUTION_TIMEOUT_SECS must be an integer"),
            }
        }
        if let Some(flag) = lookup("MLBF_PUBLISH_ENABLED") {
            match parse_bool(&flag) {
                Some(enabled) => config.publish_enabled = enabled,
                None => warn!("MLBF_PUBLISH_ENABLED must be true or false"),
            }
        }
        if let Some(flag) = lookup("MLBF_BUILD_WHEN_DISABLED") {
            match parse_bool(&flag) {
                Some(build) => config.build_when_disabled = build,
                None => warn!("MLBF_BUILD_WHEN_DISABLED must be true or false"),
            }
        }
        if let Some(flag) = lookup("MLBF_SIGN_OFF_NEEDED") {
            match parse_bool(&flag) {
                Some(needed) => config.sign_off_needed = needed,
                None => warn!("MLBF_SIGN_OFF_NEEDED must be true or false"),
            }
        }
        if let Some(key) = lookup("MLBF_GENERATION_TIME_KEY") {
            config.generation_time_key = key;
        }

        if let Some(fpr) = lookup("MLBF_PRIMARY_FPR") {
            match fpr.parse::<f64>() {
                Ok(fpr) => config.cascade.primary_fpr = Some(fpr),
                Err(_) => warn!("MLBF_PRIMARY_FPR must be a number"),
            }
        }
        if let Some(layers) = lookup("MLBF_MAX_LAYERS") {
            match layers.parse() {
                Ok(layers) => config.cascade.max_layers = layers,
                Err(_) => warn!("MLBF_MAX_LAYERS must be an integer"),
            }
        }
        if let Some(alg) = lookup("MLBF_HASH_ALGORITHM") {
            match alg.to_ascii_lowercase().as_str() {
                "murmur3" => config.cascade.hash_algorithm = HashAlgorithm::Murmur3,
                "sha256" => config.cascade.hash_algorithm = HashAlgorithm::Sha256,
                other => warn!("Unknown MLBF_HASH_ALGORITHM {}", other),
            }
        }
        if let Some(salt_hex) = lookup("MLBF_SALT") {
            match hex::decode(&salt_hex) {
                Ok(salt) if salt.len() <= u8::MAX as usize => {
                    config.cascade.salt = salt;
                    info!("Loaded filter salt from environment");
                }
                Ok(_) => warn!("MLBF_SALT must be at most 255 bytes"),
                Err(_) => warn!("MLBF_SALT must be hex encoded"),
            }
        }

        config
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
