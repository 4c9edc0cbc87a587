//! Worker configuration with layered loading.
//!
//! The worker is configured by a single injected [`WorkerConfig`]. Defaults
//! describe the portfolio site the worker was written for; figment layers a
//! TOML file and `SHELLCACHE_*` environment variables on top:
//!
//! 1. Environment variables (SHELLCACHE_*)
//! 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::resolve::{self, ResolveError};

mod validation;

pub use validation::ConfigError;

/// Worker configuration.
///
/// `cache_name` must change whenever the manifest or the caching strategy
/// changes, so a new generation gets installed and the old one reaped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Version tag naming the current cache generation.
    #[serde(default = "default_cache_name")]
    pub cache_name: String,

    /// URLs that must be cached for the offline shell, in install order.
    #[serde(default = "default_manifest_urls")]
    pub manifest_urls: Vec<String>,

    /// Substrings identifying third-party asset hosts (served cache-first).
    #[serde(default = "default_external_host_patterns")]
    pub external_host_patterns: Vec<String>,

    /// Substrings identifying the web-font stylesheet host. A failed fetch
    /// against it is answered with an empty `200 OK`.
    #[serde(default = "default_font_host_patterns")]
    pub font_host_patterns: Vec<String>,

    /// Document served to offline navigations without an entry of their own.
    #[serde(default = "default_shell_url")]
    pub shell_url: String,

    /// Origin that root-relative URLs resolve against.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Path to the SQLite cache database.
    ///
    /// Set via SHELLCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for network requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP client timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum number of redirects a fetch follows.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

fn default_cache_name() -> String {
    "portfolio-v2".into()
}

fn default_manifest_urls() -> Vec<String> {
    [
        "/",
        "/index.html",
        "/img/img1.jpg",
        "/manifest.json",
        "/sw.js",
        "https://fonts.googleapis.com/css2?family=Inter:wght@300;400;500;600;700;800;900&display=swap",
        "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.4.0/css/all.min.css",
        "https://cdn.socket.io/4.7.2/socket.io.min.js",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_external_host_patterns() -> Vec<String> {
    vec!["fonts.googleapis.com".into(), "cdnjs.cloudflare.com".into(), "socket.io".into()]
}

fn default_font_host_patterns() -> Vec<String> {
    vec!["fonts.googleapis.com".into()]
}

fn default_shell_url() -> String {
    "/index.html".into()
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./shellcache.sqlite")
}

fn default_user_agent() -> String {
    "shellcache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_redirects() -> usize {
    5
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            cache_name: default_cache_name(),
            manifest_urls: default_manifest_urls(),
            external_host_patterns: default_external_host_patterns(),
            font_host_patterns: default_font_host_patterns(),
            shell_url: default_shell_url(),
            origin: default_origin(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_redirects: default_max_redirects(),
        }
    }
}

impl WorkerConfig {
    /// Configuration with the given generation tag and manifest, every other
    /// field at its default. Mostly useful for fixtures.
    pub fn new(cache_name: impl Into<String>, manifest_urls: &[&str]) -> Self {
        Self {
            cache_name: cache_name.into(),
            manifest_urls: manifest_urls.iter().map(|u| u.to_string()).collect(),
            ..Default::default()
        }
    }

    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Parsed site origin.
    pub fn origin_url(&self) -> Result<Url, ResolveError> {
        Url::parse(&self.origin).map_err(|e| ResolveError::InvalidUrl(e.to_string()))
    }

    /// Resolve a possibly root-relative URL against the site origin.
    pub fn resolve(&self, input: &str) -> Result<Url, ResolveError> {
        resolve::resolve(&self.origin_url()?, input)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SHELLCACHE_`
    /// 2. TOML file from `SHELLCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file or environment cannot be parsed or
    /// validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SHELLCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SHELLCACHE_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
