use std::env;
use std::time::Duration;

use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::domain::auth::models::TokenTtls;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub tokens: TokensConfig,
    #[serde(default)]
    pub reaper: ReaperConfig,
    pub mail: MailConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_environment")]
    pub environment: String,
}

/// Role/permission cache. Without a `url` the service runs uncached.
#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    pub url: Option<String>,
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_cache_operation_timeout_ms")]
    pub operation_timeout_ms: u64,
}

/// Token lifetimes in seconds.
#[derive(Debug, Deserialize, Clone)]
pub struct TokensConfig {
    #[serde(default = "default_authentication_ttl_secs")]
    pub authentication_ttl_secs: i64,
    #[serde(default = "default_refresh_ttl_secs")]
    pub refresh_ttl_secs: i64,
    #[serde(default = "default_activation_ttl_secs")]
    pub activation_ttl_secs: i64,
    #[serde(default = "default_password_reset_ttl_secs")]
    pub password_reset_ttl_secs: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReaperConfig {
    #[serde(default = "default_reaper_period_secs")]
    pub period_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    /// Deliver through SMTP; when false mail is only logged.
    #[serde(default)]
    pub enabled: bool,
    pub host: String,
    #[serde(default = "default_mail_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub sender: String,
    #[serde(default = "default_use_tls")]
    pub use_tls: bool,
}

fn default_max_connections() -> u32 {
    25
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_cache_operation_timeout_ms() -> u64 {
    500
}

fn default_authentication_ttl_secs() -> i64 {
    60 * 60
}

fn default_refresh_ttl_secs() -> i64 {
    15 * 24 * 60 * 60
}

fn default_activation_ttl_secs() -> i64 {
    12 * 60 * 60
}

fn default_password_reset_ttl_secs() -> i64 {
    45 * 60
}

fn default_reaper_period_secs() -> u64 {
    12 * 60 * 60
}

fn default_mail_port() -> u16 {
    587
}

fn default_use_tls() -> bool {
    true
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: None,
            ttl_secs: default_cache_ttl_secs(),
            operation_timeout_ms: default_cache_operation_timeout_ms(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

impl Default for TokensConfig {
    fn default() -> Self {
        Self {
            authentication_ttl_secs: default_authentication_ttl_secs(),
            refresh_ttl_secs: default_refresh_ttl_secs(),
            activation_ttl_secs: default_activation_ttl_secs(),
            password_reset_ttl_secs: default_password_reset_ttl_secs(),
        }
    }
}

impl TokensConfig {
    pub fn ttls(&self) -> TokenTtls {
        TokenTtls {
            authentication: chrono::Duration::seconds(self.authentication_ttl_secs),
            refresh: chrono::Duration::seconds(self.refresh_ttl_secs),
            activation: chrono::Duration::seconds(self.activation_ttl_secs),
            password_reset: chrono::Duration::seconds(self.password_reset_ttl_secs),
        }
    }
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            period_secs: default_reaper_period_secs(),
        }
    }
}

impl ReaperConfig {
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs)
    }
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, CACHE__URL, MAIL__HOST, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: CACHE__URL=redis://... overrides cache.url
            .add_source(Environment::with_prefix("").separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;

        Ok(config)
    }
}
