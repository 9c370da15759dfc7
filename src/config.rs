//! Runtime settings: file first, then environment overrides.

use crate::core::labels::DEFAULT_LIQUID_TICKERS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstateConfig {
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
    #[serde(default = "default_price_cache_path")]
    pub price_cache_path: PathBuf,
    #[serde(default = "default_price_api_base")]
    pub price_api_base: String,
    #[serde(default)]
    pub price_api_key: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Quota usage fraction above which lookups pause.
    #[serde(default = "default_throttle_threshold")]
    pub throttle_threshold: f64,
    #[serde(default = "default_throttle_pause_ms")]
    pub throttle_pause_ms: u64,
    #[serde(default = "default_liquid_tickers")]
    pub liquid_tickers: Vec<String>,
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("data/estate_snapshot.json")
}

fn default_price_cache_path() -> PathBuf {
    PathBuf::from("data/price_cache.json")
}

fn default_price_api_base() -> String {
    "https://api.polygon.io".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_throttle_threshold() -> f64 {
    0.8
}

fn default_throttle_pause_ms() -> u64 {
    1000
}

fn default_liquid_tickers() -> Vec<String> {
    DEFAULT_LIQUID_TICKERS.iter().map(|t| t.to_string()).collect()
}

impl Default for EstateConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
            price_cache_path: default_price_cache_path(),
            price_api_base: default_price_api_base(),
            price_api_key: None,
            request_timeout_secs: default_request_timeout_secs(),
            throttle_threshold: default_throttle_threshold(),
            throttle_pause_ms: default_throttle_pause_ms(),
            liquid_tickers: default_liquid_tickers(),
        }
    }
}

impl EstateConfig {
    /// Load from an optional JSON file, then apply `ESTATE_*` overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = config.with_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production).
    pub fn with_env_overrides<F>(mut self, var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = var("ESTATE_SNAPSHOT") {
            self.snapshot_path = PathBuf::from(path);
        }
        if let Some(path) = var("ESTATE_PRICE_CACHE") {
            self.price_cache_path = PathBuf::from(path);
        }
        if let Some(key) = var("ESTATE_PRICE_API_KEY").filter(|k| !k.is_empty()) {
            self.price_api_key = Some(key);
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.throttle_threshold > 0.0 && self.throttle_threshold <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "throttle_threshold must be in (0, 1], got {}",
                self.throttle_threshold
            )));
        }
        if self.liquid_tickers.is_empty() {
            return Err(ConfigError::Invalid("liquid_tickers must not be empty".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request_timeout_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn throttle_pause(&self) -> Duration {
        Duration::from_millis(self.throttle_pause_ms)
    }
}
