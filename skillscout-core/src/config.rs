//! Configuration for the marketplace client.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Marketplace client configuration, loaded from `skillscout.toml`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MarketplaceConfig {
    /// Marketplace URLs to aggregate.
    #[serde(default)]
    pub marketplaces: Vec<String>,

    /// Age in seconds below which cached data needs no refresh.
    #[serde(default = "default_fresh_ttl_secs")]
    pub fresh_ttl_secs: u64,

    /// Age in seconds beyond which cached data is discarded entirely.
    #[serde(default = "default_stale_ttl_secs")]
    pub stale_ttl_secs: u64,

    /// Per-request network timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Directory for the persisted cache snapshot.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Default install destination.
    #[serde(default)]
    pub install_dir: Option<PathBuf>,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            marketplaces: Vec::new(),
            fresh_ttl_secs: default_fresh_ttl_secs(),
            stale_ttl_secs: default_stale_ttl_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            cache_dir: None,
            install_dir: None,
        }
    }
}

fn default_fresh_ttl_secs() -> u64 {
    300
}

fn default_stale_ttl_secs() -> u64 {
    86_400
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl MarketplaceConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config at {}", path.display()))
    }

    /// Load an explicit path, else the default location when it exists,
    /// else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("skillscout").join("skillscout.toml"))
    }

    pub fn resolved_cache_dir(&self) -> Option<PathBuf> {
        self.cache_dir
            .clone()
            .or_else(|| dirs::cache_dir().map(|dir| dir.join("skillscout")))
    }

    pub fn resolved_install_dir(&self) -> PathBuf {
        self.install_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|dir| dir.join("skillscout").join("plugins"))
                .unwrap_or_else(|| PathBuf::from("skillscout-plugins"))
        })
    }
}
