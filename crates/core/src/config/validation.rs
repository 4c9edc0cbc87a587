//! Configuration validation rules.
//!
//! This module provides validation logic for `WorkerConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::WorkerConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl WorkerConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `cache_name` or the manifest is empty,
    /// and `ConfigError::Invalid` if:
    /// - a host pattern is empty (it would match every URL)
    /// - `origin` is not an absolute http(s) URL
    /// - a manifest URL or `shell_url` does not resolve against the origin
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `max_redirects` exceeds 20
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_name.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "cache_name".into(),
                hint: "Set SHELLCACHE_CACHE_NAME to the current version tag".into(),
            });
        }

        if self.manifest_urls.is_empty() {
            return Err(ConfigError::Missing {
                field: "manifest_urls".into(),
                hint: "List the URLs the offline shell needs".into(),
            });
        }

        for (field, patterns) in
            [("external_host_patterns", &self.external_host_patterns), ("font_host_patterns", &self.font_host_patterns)]
        {
            if patterns.iter().any(|p| p.is_empty()) {
                return Err(ConfigError::Invalid { field: field.into(), reason: "patterns must not be empty".into() });
            }
        }

        let origin = self
            .origin_url()
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })?;
        if !matches!(origin.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid { field: "origin".into(), reason: "must be an http(s) URL".into() });
        }

        for url in &self.manifest_urls {
            self.resolve(url)
                .map_err(|e| ConfigError::Invalid { field: "manifest_urls".into(), reason: format!("{url}: {e}") })?;
        }

        self.resolve(&self.shell_url)
            .map_err(|e| ConfigError::Invalid { field: "shell_url".into(), reason: e.to_string() })?;

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.max_redirects > 20 {
            return Err(ConfigError::Invalid { field: "max_redirects".into(), reason: "must not exceed 20".into() });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if !self.manifest_urls.iter().any(|u| u == &self.shell_url) {
            tracing::warn!(
                shell_url = %self.shell_url,
                "shell_url is not part of the manifest; offline navigations may have no fallback"
            );
        }

        Ok(())
    }
}
