//! Configuration loading and validation

use anyhow::{Context, Result, bail};
use paste_core::cache::{DEFAULT_ACCESS_WINDOW, DEFAULT_ENTRY_TTL, DEFAULT_PROMOTION_THRESHOLD};
use paste_core::keygen::DEFAULT_RANDOM_LENGTH;
use paste_core::sweeper::DEFAULT_SCHEDULE;
use paste_core::{CachePolicy, KeyGenerator, RedisCacheConfig, SweepSchedule};
use paste_storage::S3Config;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub cache: CacheConfig,
    pub keys: KeysConfig,
    pub sweeper: SweeperConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl DatabaseConfig {
    /// SQLite connection URL, creating the file if missing
    pub fn url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Local,
    S3,
}

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default)]
    pub local: LocalStorageConfig,
    #[serde(default)]
    pub s3: S3StorageConfig,
}

/// Local storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalStorageConfig {
    #[serde(default = "default_local_path")]
    pub path: String,
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            path: default_local_path(),
        }
    }
}

/// S3 storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct S3StorageConfig {
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub prefix: Option<String>,
    #[serde(default)]
    pub allow_http: bool,
}

impl S3StorageConfig {
    pub fn to_s3_config(&self) -> S3Config {
        let defaults = S3Config::default();
        S3Config {
            bucket: self.bucket.clone().unwrap_or(defaults.bucket),
            region: self.region.clone().unwrap_or(defaults.region),
            endpoint: self.endpoint.clone(),
            access_key_id: self.access_key.clone(),
            secret_access_key: self.secret_key.clone(),
            prefix: self.prefix.clone(),
            allow_http: self.allow_http,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Memory,
    Redis,
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,
    /// Lifetime of cached paste text
    #[serde(default = "default_entry_ttl_secs")]
    pub entry_ttl_secs: u64,
    /// Lifetime of an access counter from its first read
    #[serde(default = "default_access_window_secs")]
    pub access_window_secs: u64,
    /// Reads within the window needed before text is cached
    #[serde(default = "default_promotion_threshold")]
    pub promotion_threshold: i64,
    /// How often the memory backend drops expired slots
    #[serde(default = "default_purge_interval_secs")]
    pub purge_interval_secs: u64,
    #[serde(default)]
    pub redis: RedisConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            entry_ttl_secs: default_entry_ttl_secs(),
            access_window_secs: default_access_window_secs(),
            promotion_threshold: default_promotion_threshold(),
            purge_interval_secs: default_purge_interval_secs(),
            redis: RedisConfig::default(),
        }
    }
}

impl CacheConfig {
    pub fn policy(&self) -> CachePolicy {
        CachePolicy {
            entry_ttl: Duration::from_secs(self.entry_ttl_secs),
            access_window: Duration::from_secs(self.access_window_secs),
            promotion_threshold: self.promotion_threshold,
        }
    }

    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.purge_interval_secs)
    }
}

/// Redis cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,
    #[serde(default = "default_redis_prefix")]
    pub prefix: String,
    #[serde(default = "default_redis_pool_size")]
    pub pool_size: usize,
    #[serde(default = "default_redis_timeout_secs")]
    pub connection_timeout_secs: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            prefix: default_redis_prefix(),
            pool_size: default_redis_pool_size(),
            connection_timeout_secs: default_redis_timeout_secs(),
        }
    }
}

impl RedisConfig {
    pub fn to_cache_config(&self) -> RedisCacheConfig {
        RedisCacheConfig {
            url: self.url.clone(),
            prefix: self.prefix.clone(),
            pool_size: self.pool_size,
            connection_timeout: Duration::from_secs(self.connection_timeout_secs),
        }
    }
}

/// Key generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeysConfig {
    /// Length of the random part of each key
    #[serde(default = "default_random_length")]
    pub random_length: usize,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            random_length: default_random_length(),
        }
    }
}

/// Expiry sweeper configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweeperConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cron expression (seconds field optional), evaluated in UTC
    #[serde(default = "default_schedule")]
    pub schedule: String,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            schedule: default_schedule(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_db_path() -> String {
    "./data/pastebin.db".to_string()
}

fn default_local_path() -> String {
    "./data/blobs".to_string()
}

fn default_entry_ttl_secs() -> u64 {
    DEFAULT_ENTRY_TTL.as_secs()
}

fn default_access_window_secs() -> u64 {
    DEFAULT_ACCESS_WINDOW.as_secs()
}

fn default_promotion_threshold() -> i64 {
    DEFAULT_PROMOTION_THRESHOLD
}

fn default_purge_interval_secs() -> u64 {
    60
}

fn default_redis_url() -> String {
    RedisCacheConfig::default().url
}

fn default_redis_prefix() -> String {
    RedisCacheConfig::default().prefix
}

fn default_redis_pool_size() -> usize {
    RedisCacheConfig::default().pool_size
}

fn default_redis_timeout_secs() -> u64 {
    RedisCacheConfig::default().connection_timeout.as_secs()
}

fn default_random_length() -> usize {
    DEFAULT_RANDOM_LENGTH
}

fn default_schedule() -> String {
    DEFAULT_SCHEDULE.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults if it
    /// does not exist
    pub fn load(path: &str) -> Result<Self> {
        let config_path = Path::new(path);

        if !config_path.exists() {
            info!("Config file not found at {}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config = Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path))?;

        info!("Loaded configuration from {}", path);
        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the services cannot start with
    pub fn validate(&self) -> Result<()> {
        KeyGenerator::new(self.keys.random_length).context("Invalid [keys] section")?;

        if self.sweeper.enabled {
            SweepSchedule::parse(&self.sweeper.schedule).context("Invalid [sweeper] section")?;
        }

        if self.cache.entry_ttl_secs == 0 {
            bail!("cache.entry_ttl_secs must be greater than zero");
        }
        if self.cache.access_window_secs == 0 {
            bail!("cache.access_window_secs must be greater than zero");
        }
        if self.cache.promotion_threshold < 0 {
            bail!("cache.promotion_threshold must not be negative");
        }
        if self.cache.purge_interval_secs == 0 {
            bail!("cache.purge_interval_secs must be greater than zero");
        }
        if self.cache.backend == CacheBackend::Redis && self.cache.redis.pool_size == 0 {
            bail!("cache.redis.pool_size must be greater than zero");
        }

        if self.storage.backend == StorageBackend::S3
            && self
                .storage
                .s3
                .bucket
                .as_deref()
                .is_some_and(|b| b.trim().is_empty())
        {
            bail!("storage.s3.bucket must not be empty");
        }

        Ok(())
    }
}
