//! Configuration loading, validation, and management for Quarry.
//!
//! Loads configuration from `~/.quarry/config.toml` with environment
//! variable overrides. Validates all settings at startup.
//!
//! The warehouse access token is treated as an opaque bearer secret: it is
//! read from config or `SNOWFLAKE_TOKEN` and never logged or printed. How the
//! token is minted (key pair, OAuth, PAT) is outside this crate.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.quarry/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model (LLM) settings
    #[serde(default)]
    pub model: ModelConfig,

    /// Agent loop settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Warehouse connection settings
    #[serde(default)]
    pub warehouse: WarehouseConfig,

    /// Semantic model settings
    #[serde(default)]
    pub semantic: SemanticConfig,
}

/// Model gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model name passed to the Cortex inference endpoint
    #[serde(default = "default_model")]
    pub name: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_model() -> String {
    "claude-3-5-sonnet".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Agent loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Step budget: maximum reasoning steps per run
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
}

fn default_max_steps() -> usize {
    8
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
        }
    }
}

/// Warehouse connection settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct WarehouseConfig {
    /// Account host, e.g. "myorg-account.snowflakecomputing.com"
    #[serde(default)]
    pub host: String,

    /// Bearer token for the SQL and Cortex REST APIs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Role to assume
    #[serde(default)]
    pub role: Option<String>,

    /// Virtual warehouse to run statements on
    #[serde(default)]
    pub warehouse: Option<String>,

    /// Default database
    #[serde(default)]
    pub database: Option<String>,

    /// Default schema
    #[serde(default)]
    pub schema: Option<String>,

    /// Statement timeout in seconds
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,
}

fn default_query_timeout() -> u64 {
    60
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            token: None,
            role: None,
            warehouse: None,
            database: None,
            schema: None,
            query_timeout_secs: default_query_timeout(),
        }
    }
}

/// Semantic model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticConfig {
    /// Path to the semantic model YAML file
    #[serde(default = "default_semantic_path")]
    pub model_path: PathBuf,
}

fn default_semantic_path() -> PathBuf {
    PathBuf::from("semantic_models/revenue_timeseries.yaml")
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            model_path: default_semantic_path(),
        }
    }
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("model", &self.model)
            .field("agent", &self.agent)
            .field("warehouse", &self.warehouse)
            .field("semantic", &self.semantic)
            .finish()
    }
}

impl std::fmt::Debug for WarehouseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WarehouseConfig")
            .field("host", &self.host)
            .field("token", &redact(&self.token))
            .field("role", &self.role)
            .field("warehouse", &self.warehouse)
            .field("database", &self.database)
            .field("schema", &self.schema)
            .field("query_timeout_secs", &self.query_timeout_secs)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.quarry/config.toml).
    ///
    /// Environment overrides (highest priority):
    /// - `SNOWFLAKE_HOST` → warehouse.host
    /// - `SNOWFLAKE_TOKEN` → warehouse.token
    /// - `SNOWFLAKE_ROLE`, `SNOWFLAKE_WAREHOUSE`, `SNOWFLAKE_DATABASE`,
    ///   `SNOWFLAKE_SCHEMA`
    /// - `QUARRY_MODEL` → model.name
    /// - `QUARRY_MAX_STEPS` → agent.max_steps
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if let Ok(host) = std::env::var("SNOWFLAKE_HOST") {
            config.warehouse.host = host;
        }
        if config.warehouse.token.is_none() {
            config.warehouse.token = std::env::var("SNOWFLAKE_TOKEN").ok();
        }
        if let Ok(role) = std::env::var("SNOWFLAKE_ROLE") {
            config.warehouse.role = Some(role);
        }
        if let Ok(wh) = std::env::var("SNOWFLAKE_WAREHOUSE") {
            config.warehouse.warehouse = Some(wh);
        }
        if let Ok(db) = std::env::var("SNOWFLAKE_DATABASE") {
            config.warehouse.database = Some(db);
        }
        if let Ok(schema) = std::env::var("SNOWFLAKE_SCHEMA") {
            config.warehouse.schema = Some(schema);
        }
        if let Ok(model) = std::env::var("QUARRY_MODEL") {
            config.model.name = model;
        }
        if let Ok(steps) = std::env::var("QUARRY_MAX_STEPS") {
            config.agent.max_steps = steps.parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "QUARRY_MAX_STEPS must be a positive integer, got '{steps}'"
                ))
            })?;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".quarry")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.temperature < 0.0 || self.model.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "model.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.agent.max_steps == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_steps must be at least 1".into(),
            ));
        }
        if self.warehouse.query_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "warehouse.query_timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Validate that the warehouse connection is usable (host + token set).
    /// Separate from [`validate`](Self::validate) so offline commands can
    /// still run with a partial config.
    pub fn require_warehouse(&self) -> Result<(), ConfigError> {
        if self.warehouse.host.is_empty() {
            return Err(ConfigError::ValidationError(
                "warehouse.host is not set (config or SNOWFLAKE_HOST)".into(),
            ));
        }
        if self.warehouse.token.is_none() {
            return Err(ConfigError::ValidationError(
                "warehouse.token is not set (config or SNOWFLAKE_TOKEN)".into(),
            ));
        }
        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            agent: AgentConfig::default(),
            warehouse: WarehouseConfig::default(),
            semantic: SemanticConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
