//! Map configuration
//!
//! A [`MapConfig`] is built once (in code or from JSON) and handed to the
//! [`MapBuilder`](crate::core::builder::MapBuilder). Nothing in it changes
//! after the map is built; switching the active provider only selects among
//! the providers listed here.

use crate::core::constants::{
    ABSOLUTE_MAX_ZOOM, DEFAULT_MIN_ZOOM, LAZY_SET_CENTER_DIFFERENCE, TILE_SIZE,
};
use crate::core::tiling::VerticalPolicy;
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One named tile provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    /// URL with `{z}`, `{x}`, `{y}` and optional `{s}` placeholders
    pub url_template: String,
    #[serde(default = "default_tile_size")]
    pub tile_size: u32,
    #[serde(default = "default_max_zoom")]
    pub max_zoom: u8,
    #[serde(default)]
    pub subdomains: Vec<String>,
}

impl ProviderConfig {
    pub fn new(name: impl Into<String>, url_template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url_template: url_template.into(),
            tile_size: TILE_SIZE,
            max_zoom: default_max_zoom(),
            subdomains: Vec::new(),
        }
    }

    /// The public OpenStreetMap Mapnik tiles
    pub fn openstreetmap() -> Self {
        Self {
            subdomains: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            ..Self::new("OpenStreetMap", "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png")
        }
    }

    pub fn with_max_zoom(mut self, max_zoom: u8) -> Self {
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }
}

/// Configuration for a map view and its tile providers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    pub providers: Vec<ProviderConfig>,
    /// Root directory of the on-disk tile cache
    #[serde(default = "default_map_path")]
    pub map_path: PathBuf,
    #[serde(default)]
    pub placeholder_cant_load: Option<PathBuf>,
    #[serde(default)]
    pub placeholder_loading: Option<PathBuf>,
    #[serde(default = "default_min_zoom")]
    pub min_zoom: u8,
    #[serde(default = "default_lazy_threshold")]
    pub lazy_threshold: f64,
    #[serde(default)]
    pub vertical_policy: VerticalPolicy,
    /// Decoded tiles kept in memory per provider
    #[serde(default = "default_memory_cache_tiles")]
    pub memory_cache_tiles: usize,
}

fn default_tile_size() -> u32 {
    TILE_SIZE
}

fn default_max_zoom() -> u8 {
    18
}

fn default_map_path() -> PathBuf {
    std::env::temp_dir().join("cachemap-tiles")
}

fn default_min_zoom() -> u8 {
    DEFAULT_MIN_ZOOM
}

fn default_lazy_threshold() -> f64 {
    LAZY_SET_CENTER_DIFFERENCE
}

fn default_memory_cache_tiles() -> usize {
    256
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            providers: vec![ProviderConfig::openstreetmap()],
            map_path: default_map_path(),
            placeholder_cant_load: None,
            placeholder_loading: None,
            min_zoom: default_min_zoom(),
            lazy_threshold: default_lazy_threshold(),
            vertical_policy: VerticalPolicy::default(),
            memory_cache_tiles: default_memory_cache_tiles(),
        }
    }
}

impl MapConfig {
    /// Parses and validates a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: MapConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.providers.is_empty() {
            return Err(MapError::Config("at least one map provider is required".into()));
        }
        if !(self.lazy_threshold > 0.0) {
            return Err(MapError::Config(format!(
                "lazy_threshold must be positive, got {}",
                self.lazy_threshold
            )));
        }
        for provider in &self.providers {
            if provider.tile_size == 0 {
                return Err(MapError::Config(format!(
                    "provider '{}' has a tile size of zero",
                    provider.name
                )));
            }
            if provider.max_zoom > ABSOLUTE_MAX_ZOOM {
                return Err(MapError::Config(format!(
                    "provider '{}' max_zoom {} exceeds {}",
                    provider.name, provider.max_zoom, ABSOLUTE_MAX_ZOOM
                )));
            }
            if self.min_zoom > provider.max_zoom {
                return Err(MapError::Config(format!(
                    "min_zoom {} is above the max_zoom {} of provider '{}'",
                    self.min_zoom, provider.max_zoom, provider.name
                )));
            }
        }
        Ok(())
    }

    /// Cache directory for one provider
    pub fn provider_path(&self, provider: &ProviderConfig) -> PathBuf {
        self.map_path.join(&provider.name)
    }

    pub fn with_provider(mut self, provider: ProviderConfig) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn with_vertical_policy(mut self, policy: VerticalPolicy) -> Self {
        self.vertical_policy = policy;
        self
    }

    pub fn with_lazy_threshold(mut self, threshold: f64) -> Self {
        self.lazy_threshold = threshold;
        self
    }
}
