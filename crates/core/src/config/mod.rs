//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (ROOST_*)
//! 2. TOML config file (if ROOST_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::remote::DEFAULT_PAGE_SIZE;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (ROOST_*)
/// 2. TOML config file (if ROOST_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the remote catalog's function endpoints.
    ///
    /// Set via ROOST_API_BASE_URL environment variable.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Bearer token sent to the remote catalog, if it requires one.
    ///
    /// Set via ROOST_API_KEY environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Path to the SQLite search cache.
    ///
    /// Set via ROOST_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Path to the SQLite partial replica.
    ///
    /// Set via ROOST_REPLICA_PATH environment variable.
    #[serde(default = "default_replica_path")]
    pub replica_path: PathBuf,

    /// Directory for the on-disk image cache.
    ///
    /// Set via ROOST_IMAGE_CACHE_DIR environment variable.
    #[serde(default = "default_image_cache_dir")]
    pub image_cache_dir: PathBuf,

    /// Images held in the in-memory tier before the least recently used are evicted.
    ///
    /// Set via ROOST_IMAGE_MEMORY_ENTRIES environment variable.
    #[serde(default = "default_image_memory_entries")]
    pub image_memory_entries: usize,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via ROOST_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via ROOST_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Results requested per remote search.
    ///
    /// Set via ROOST_PAGE_SIZE environment variable.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Name of the replica subscription that tracks the interest set.
    ///
    /// Set via ROOST_SUBSCRIPTION_NAME environment variable.
    #[serde(default = "default_subscription_name")]
    pub subscription_name: String,

    /// Start with the replica's sync paused.
    ///
    /// Set via ROOST_START_OFFLINE environment variable.
    #[serde(default)]
    pub start_offline: bool,
}

fn default_api_base_url() -> String {
    "http://localhost:8080/api".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./roost-cache.sqlite")
}

fn default_replica_path() -> PathBuf {
    PathBuf::from("./roost-replica.sqlite")
}

fn default_image_cache_dir() -> PathBuf {
    PathBuf::from("./roost-images")
}

fn default_image_memory_entries() -> usize {
    200
}

fn default_user_agent() -> String {
    "roost/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_subscription_name() -> String {
    "listing".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_key: None,
            db_path: default_db_path(),
            replica_path: default_replica_path(),
            image_cache_dir: default_image_cache_dir(),
            image_memory_entries: default_image_memory_entries(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            page_size: default_page_size(),
            subscription_name: default_subscription_name(),
            start_offline: false,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `ROOST_`
    /// 2. TOML file from `ROOST_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("ROOST_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("ROOST_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.api_base_url, "http://localhost:8080/api");
        assert_eq!(config.db_path, PathBuf::from("./roost-cache.sqlite"));
        assert_eq!(config.replica_path, PathBuf::from("./roost-replica.sqlite"));
        assert_eq!(config.image_cache_dir, PathBuf::from("./roost-images"));
        assert_eq!(config.image_memory_entries, 200);
        assert_eq!(config.user_agent, "roost/0.1");
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.page_size, 20);
        assert_eq!(config.subscription_name, "listing");
        assert!(!config.start_offline);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }
}
