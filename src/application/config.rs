// src/application/config.rs
//
// Application configuration
//
// PRINCIPLES:
// - Every field has a default; an absent file is a valid configuration
// - A malformed file is an error, never silently ignored
// - Placeholder endpoints force the mock data source

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::services::{ControllerConfig, PlaybackTimerConfig};

const CONFIG_DIR: &str = "post_playback_rating";
const CONFIG_FILE: &str = "config.json";

/// Marker host used by unconfigured endpoints
pub const PLACEHOLDER_HOST: &str = "placeholder.invalid";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    #[default]
    Mock,
    Network,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub content_base_url: String,
    pub metadata_base_url: String,
    pub timeout_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        let placeholder = format!("https://{}/", PLACEHOLDER_HOST);
        Self {
            content_base_url: placeholder.clone(),
            metadata_base_url: placeholder,
            timeout_ms: 10_000,
        }
    }
}

impl NetworkConfig {
    /// True if any base URL is blank or still points at the placeholder host
    pub fn is_missing_or_placeholder(&self) -> bool {
        [&self.content_base_url, &self.metadata_base_url]
            .iter()
            .any(|url| url.trim().is_empty() || url.contains(PLACEHOLDER_HOST))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Content rated by the demo playback
    pub content_id: String,
    /// SQLite file for rating state; platform data dir when unset
    pub database_path: Option<PathBuf>,
    /// Keep rating state in memory only
    pub in_memory_ratings: bool,
    pub data_source: DataSource,
    pub network: NetworkConfig,
    pub playback: PlaybackTimerConfig,
    pub overlay: ControllerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            content_id: "content-123".to_string(),
            database_path: None,
            in_memory_ratings: false,
            data_source: DataSource::Mock,
            network: NetworkConfig::default(),
            playback: PlaybackTimerConfig::default(),
            overlay: ControllerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from `path`, or from the platform config dir when `None`.
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) => path,
                None => {
                    log::debug!("No platform config directory, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path)?;
        let config = Self::from_json(&raw)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(raw: &str) -> AppResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Data source actually used: Network only when its endpoints are real
    pub fn effective_data_source(&self) -> DataSource {
        match self.data_source {
            DataSource::Network if self.network.is_missing_or_placeholder() => {
                log::warn!("Network data source requested but endpoints are not configured, using mock data");
                DataSource::Mock
            }
            other => other,
        }
    }

    pub fn resolve_database_path(&self) -> AppResult<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => crate::db::get_database_path(),
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.content_id.trim().is_empty() {
            return Err(AppError::Other("content_id must not be blank".to_string()));
        }
        if self.playback.duration_ms == 0 {
            return Err(AppError::Other("playback.duration_ms must be positive".to_string()));
        }
        Ok(())
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}
