// Process configuration.
// Loads a JSON config file, applies environment overrides, and validates the result.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::Deserialize;

use crate::cache::DEFAULT_PAGE_SIZE;
use crate::catalog::{DEFAULT_BATCH_SIZE, PopulateOptions, ReadThroughOptions};
use crate::error::{Error, Result};

/// Environment variable overriding `upstream.public_key`.
pub const PUBLIC_KEY_VAR: &str = "CATALOG_PUBLIC_KEY";
/// Environment variable overriding `upstream.private_key`.
pub const PRIVATE_KEY_VAR: &str = "CATALOG_PRIVATE_KEY";
/// Environment variable overriding `upstream.url`.
pub const API_URL_VAR: &str = "CATALOG_API_URL";

/// Upstream catalog API settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub url: String,
    pub public_key: String,
    pub private_key: String,
    pub timeout_in_sec: u64,
    pub page_size: u32,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: "https://gateway.marvel.com".to_string(),
            public_key: String::new(),
            private_key: String::new(),
            timeout_in_sec: 10,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_in_sec)
    }
}

/// Cache store settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub url: String,
    pub expiration_in_sec: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            expiration_in_sec: 60 * 60,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.expiration_in_sec)
    }
}

/// Reader-facing settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub timeout_in_sec: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { timeout_in_sec: 2 }
    }
}

/// Background population settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PopulateConfig {
    pub timeout_in_sec: u64,
    pub batch_size: usize,
    pub max_in_flight: usize,
    pub max_queue: usize,
}

impl Default for PopulateConfig {
    fn default() -> Self {
        Self {
            timeout_in_sec: 30,
            batch_size: DEFAULT_BATCH_SIZE,
            max_in_flight: 64,
            max_queue: 1024,
        }
    }
}

/// Output format of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Simplified,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub format: LogFormat,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

/// Complete process configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub upstream: UpstreamConfig,
    pub cache: CacheConfig,
    pub server: ServerConfig,
    pub populate: PopulateConfig,
    /// Last page populated by `warm` when no page count is given.
    pub warmup_pages: i64,
    pub logging: Logging,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upstream: UpstreamConfig::default(),
            cache: CacheConfig::default(),
            server: ServerConfig::default(),
            populate: PopulateConfig::default(),
            warmup_pages: 15,
            logging: Logging::default(),
        }
    }
}

/// Default config file location (e.g. ~/.config/catalog-cache/config.json).
pub fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "catalog-cache").map(|dirs| dirs.config_dir().join("config.json"))
}

impl Config {
    /// Load the configuration.
    ///
    /// An explicit `path` must exist. Without one, the default location is tried and
    /// missing files fall back to defaults. Environment overrides apply in both cases.
    pub fn get(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };

        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file without overrides or validation.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Replace upstream settings with values from `lookup` where present.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(PUBLIC_KEY_VAR) {
            self.upstream.public_key = key;
        }
        if let Some(key) = lookup(PRIVATE_KEY_VAR) {
            self.upstream.private_key = key;
        }
        if let Some(url) = lookup(API_URL_VAR) {
            self.upstream.url = url;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.upstream.public_key.is_empty() || self.upstream.private_key.is_empty() {
            return Err(Error::Config(format!(
                "upstream keys missing, set upstream.public_key/private_key or {}/{}",
                PUBLIC_KEY_VAR, PRIVATE_KEY_VAR
            )));
        }
        let positive = [
            ("upstream.page_size", u64::from(self.upstream.page_size)),
            ("upstream.timeout_in_sec", self.upstream.timeout_in_sec),
            ("cache.expiration_in_sec", self.cache.expiration_in_sec),
            ("server.timeout_in_sec", self.server.timeout_in_sec),
            ("populate.timeout_in_sec", self.populate.timeout_in_sec),
            ("populate.batch_size", self.populate.batch_size as u64),
            ("populate.max_in_flight", self.populate.max_in_flight as u64),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(Error::Config(format!("{} must be positive", name)));
        }
        Ok(())
    }

    pub fn populate_options(&self) -> PopulateOptions {
        PopulateOptions::new()
            .with_ttl(self.cache.ttl())
            .with_page_size(self.upstream.page_size)
            .with_batch_size(self.populate.batch_size)
    }

    pub fn read_through_options(&self) -> ReadThroughOptions {
        ReadThroughOptions::new()
            .with_read_timeout(Duration::from_secs(self.server.timeout_in_sec))
            .with_populate_timeout(Duration::from_secs(self.populate.timeout_in_sec))
            .with_max_in_flight(self.populate.max_in_flight)
            .with_max_queue(self.populate.max_queue)
    }
}
