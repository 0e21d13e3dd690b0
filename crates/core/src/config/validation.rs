//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `api_base_url` is not an absolute http(s) URL
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `page_size` is 0 or exceeds 100
    /// - `image_memory_entries` is 0
    /// - `user_agent` or `subscription_name` is empty
    /// - `replica_path` equals `db_path`
    pub fn validate(&self) -> Result<(), ConfigError> {
        match url::Url::parse(&self.api_base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => {
                return Err(ConfigError::Invalid {
                    field: "api_base_url".into(),
                    reason: format!("unsupported scheme: {}", url.scheme()),
                });
            }
            Err(e) => {
                return Err(ConfigError::Invalid { field: "api_base_url".into(), reason: e.to_string() });
            }
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.page_size == 0 || self.page_size > 100 {
            return Err(ConfigError::Invalid { field: "page_size".into(), reason: "must be between 1 and 100".into() });
        }

        if self.image_memory_entries == 0 {
            return Err(ConfigError::Invalid {
                field: "image_memory_entries".into(),
                reason: "must be at least 1".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.subscription_name.is_empty() {
            return Err(ConfigError::Invalid { field: "subscription_name".into(), reason: "must not be empty".into() });
        }

        if self.db_path == self.replica_path {
            return Err(ConfigError::Invalid {
                field: "replica_path".into(),
                reason: "must differ from db_path".into(),
            });
        }

        Ok(())
    }
}
