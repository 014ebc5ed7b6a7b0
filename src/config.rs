//! Configuration system for the govsearch tool server
//!
//! Configuration is loaded from a TOML file and split into sections for the
//! upstream provider, rate limits, and the observability endpoint. The API key
//! itself never appears in the file; only the name of the environment variable
//! that holds it does.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Main server configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default)]
    pub provider: ProviderSection,
    #[serde(default)]
    pub limits: LimitsSection,
    #[serde(default)]
    pub health: HealthSection,
}

/// Upstream provider section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderSection {
    /// Base URL of the provider REST API
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Environment variable containing the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ProviderSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://www.highergov.com/api-external".to_string()
}

fn default_api_key_env() -> String {
    "HIGHERGOV_API_KEY".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Rate-limit and deadline section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LimitsSection {
    /// Maximum requests per second against the provider
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
    /// Maximum requests per 24-hour window against the provider
    #[serde(default = "default_requests_per_day")]
    pub requests_per_day: u32,
    /// Behavior when a rate window is exhausted: "wait" or "fail_fast"
    #[serde(default)]
    pub on_exhaustion: ExhaustionPolicy,
    /// Overall wall-clock ceiling for a single tool invocation in seconds
    #[serde(default = "default_invocation_timeout_secs")]
    pub invocation_timeout_secs: u64,
}

impl Default for LimitsSection {
    fn default() -> Self {
        Self {
            requests_per_second: default_requests_per_second(),
            requests_per_day: default_requests_per_day(),
            on_exhaustion: ExhaustionPolicy::default(),
            invocation_timeout_secs: default_invocation_timeout_secs(),
        }
    }
}

fn default_requests_per_second() -> u32 {
    10
}

fn default_requests_per_day() -> u32 {
    100_000
}

fn default_invocation_timeout_secs() -> u64 {
    120
}

/// Policy applied when the local rate budget is exhausted
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustionPolicy {
    /// Sleep until the earliest exhausted window reopens, then proceed
    #[default]
    Wait,
    /// Fail the call immediately with a rate-limited error
    FailFast,
}

/// Observability endpoint section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthSection {
    /// Port for the health/quota HTTP server
    #[serde(default = "default_health_port")]
    pub port: u16,
    /// Whether to start the health server at all
    #[serde(default = "default_health_enabled")]
    pub enabled: bool,
}

impl Default for HealthSection {
    fn default() -> Self {
        Self {
            port: default_health_port(),
            enabled: default_health_enabled(),
        }
    }
}

fn default_health_port() -> u16 {
    8080
}

fn default_health_enabled() -> bool {
    true
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: ServerConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.base_url.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "provider.base_url must not be empty".to_string(),
            ));
        }
        if self.limits.requests_per_second == 0 {
            return Err(ConfigError::InvalidConfig(
                "limits.requests_per_second must be at least 1".to_string(),
            ));
        }
        if self.limits.requests_per_day == 0 {
            return Err(ConfigError::InvalidConfig(
                "limits.requests_per_day must be at least 1".to_string(),
            ));
        }
        if self.limits.invocation_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "limits.invocation_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve the provider API key from the configured environment variable
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        let key = std::env::var(&self.provider.api_key_env)
            .map_err(|_| ConfigError::EnvVarNotFound(self.provider.api_key_env.clone()))?;
        if key.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(format!(
                "{} is set but empty",
                self.provider.api_key_env
            )));
        }
        Ok(key)
    }
}
