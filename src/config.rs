//! Configuration loading and management
//!
//! Handles parsing of `deck.toml` configuration files.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// API endpoint configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Board behavior configuration
    #[serde(default)]
    pub board: BoardConfig,

    /// Ordering configuration
    #[serde(default)]
    pub order: OrderConfig,
}

impl Config {
    /// Load `deck.toml` from the given directory. A missing file yields the
    /// defaults; a malformed file is a user error.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let path = dir.join("deck.toml");
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path)?;
        toml::from_str(&raw).map_err(|err| Error::InvalidConfig(err.to_string()))
    }
}

/// REST API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the task service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry idempotent fetches once on transient transport errors
    #[serde(default = "default_retry_transient")]
    pub retry_transient: bool,
}

fn default_base_url() -> String {
    "http://localhost:4000".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_retry_transient() -> bool {
    true
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            retry_transient: default_retry_transient(),
        }
    }
}

/// Board behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Tasks fetched per page for each column
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Delay before a search keystroke triggers refetching
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,
}

fn default_page_size() -> usize {
    10
}

fn default_search_debounce_ms() -> u64 {
    300
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            search_debounce_ms: default_search_debounce_ms(),
        }
    }
}

/// Fractional ordering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderConfig {
    /// Smallest tolerated gap between adjacent order keys
    #[serde(default = "default_min_gap")]
    pub min_gap: f64,
}

fn default_min_gap() -> f64 {
    crate::order::MIN_ORDER_GAP
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            min_gap: default_min_gap(),
        }
    }
}
