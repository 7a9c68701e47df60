use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

pub mod defaults;

use defaults::*;

/// Cache quota and eviction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Byte ceiling of the local key/value store
    #[serde(default = "default_quota_ceiling_bytes")]
    pub quota_ceiling_bytes: u64,
    /// Usage fraction above which ambient housekeeping kicks in
    #[serde(default = "default_housekeeping_threshold")]
    pub housekeeping_threshold: f64,
    /// How many recent cached images housekeeping keeps
    #[serde(default = "default_housekeeping_keep_recent")]
    pub housekeeping_keep_recent: usize,
}

/// Image transcoding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeConfig {
    /// Inputs at or below this size skip the quality ladder entirely
    #[serde(default = "default_soft_limit_bytes")]
    pub soft_limit_bytes: u64,
    /// Bounding dimension for generated thumbnails
    #[serde(default = "default_thumbnail_max_dimension")]
    pub thumbnail_max_dimension: u32,
    /// JPEG quality for generated thumbnails (0-100)
    #[serde(default = "default_thumbnail_quality")]
    pub thumbnail_quality: u8,
}

fn default_quota_ceiling_bytes() -> u64 {
    DEFAULT_QUOTA_CEILING_BYTES
}
fn default_housekeeping_threshold() -> f64 {
    DEFAULT_HOUSEKEEPING_THRESHOLD
}
fn default_housekeeping_keep_recent() -> usize {
    DEFAULT_HOUSEKEEPING_KEEP_RECENT
}
fn default_soft_limit_bytes() -> u64 {
    DEFAULT_SOFT_LIMIT_BYTES
}
fn default_thumbnail_max_dimension() -> u32 {
    DEFAULT_THUMBNAIL_MAX_DIMENSION
}
fn default_thumbnail_quality() -> u8 {
    DEFAULT_THUMBNAIL_QUALITY
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            quota_ceiling_bytes: default_quota_ceiling_bytes(),
            housekeeping_threshold: default_housekeeping_threshold(),
            housekeeping_keep_recent: default_housekeeping_keep_recent(),
        }
    }
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            soft_limit_bytes: default_soft_limit_bytes(),
            thumbnail_max_dimension: default_thumbnail_max_dimension(),
            thumbnail_quality: default_thumbnail_quality(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub transcode: TranscodeConfig,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_file =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| "gallery-sync.toml".to_string());
        Self::load_from_file(&config_file)
    }

    pub fn load_from_file(config_file: &str) -> Result<Self> {
        if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            Ok(toml::from_str(&contents)?)
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file);
            Ok(default_config)
        }
    }
}
