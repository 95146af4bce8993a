//! TOML Configuration File Support
//!
//! Centralized configuration loading for the selection pipeline and the
//! classifier gateway, supporting a TOML file at
//! `~/.config/pivot/pivot.toml`.
//!
//! # Configuration Priority
//!
//! Values are loaded with the following priority (highest first):
//! 1. Environment variables (`PIVOT_*`)
//! 2. TOML configuration file
//! 3. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [pipeline]
//! fallback_category = "text"
//! enable_analytics = true
//!
//! [gateway]
//! init_timeout_secs = 30
//! classify_timeout_secs = 10
//! channel_capacity = 32
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::category::Category;
use crate::gateway::GatewayConfig;

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file
    #[error("failed to read config file at {path}: {source}")]
    Read {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    Validation(String),
}

/// Resolved configuration for the pipeline and gateway
#[derive(Clone, Debug, PartialEq)]
pub struct PivotConfig {
    /// Category used when classification fails
    pub fallback_category: Category,
    /// Whether the pipeline emits analytics events
    pub enable_analytics: bool,
    /// Overall deadline for gateway initialization
    pub init_timeout: Duration,
    /// Per-call deadline for gateway classification
    pub classify_timeout: Duration,
    /// Capacity of the gateway's outbound channel
    pub channel_capacity: usize,
}

impl Default for PivotConfig {
    fn default() -> Self {
        Self {
            fallback_category: Category::Text,
            enable_analytics: true,
            init_timeout: Duration::from_secs(30),
            classify_timeout: Duration::from_secs(10),
            channel_capacity: 32,
        }
    }
}

impl PivotConfig {
    /// The gateway's view of this configuration
    #[must_use]
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            init_timeout: self.init_timeout,
            classify_timeout: self.classify_timeout,
            channel_capacity: self.channel_capacity,
        }
    }
}

/// Pipeline section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct PipelineToml {
    fallback_category: Option<Category>,
    enable_analytics: Option<bool>,
}

/// Gateway section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct GatewayToml {
    init_timeout_secs: Option<u64>,
    classify_timeout_secs: Option<u64>,
    channel_capacity: Option<usize>,
}

/// Top-level TOML configuration file structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct PivotToml {
    pipeline: PipelineToml,
    gateway: GatewayToml,
}

impl PivotToml {
    fn apply(self, config: &mut PivotConfig) {
        if let Some(fallback) = self.pipeline.fallback_category {
            config.fallback_category = fallback;
        }
        if let Some(enabled) = self.pipeline.enable_analytics {
            config.enable_analytics = enabled;
        }
        if let Some(secs) = self.gateway.init_timeout_secs {
            config.init_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.gateway.classify_timeout_secs {
            config.classify_timeout = Duration::from_secs(secs);
        }
        if let Some(capacity) = self.gateway.channel_capacity {
            config.channel_capacity = capacity;
        }
    }
}

/// Default configuration file path
///
/// `$XDG_CONFIG_HOME/pivot/pivot.toml`, typically `~/.config/pivot/pivot.toml`.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pivot").join("pivot.toml"))
}

/// Load configuration from the default path, environment, and defaults
///
/// A missing config file is not an error; defaults apply.
///
/// # Errors
///
/// Returns [`ConfigError`] when an existing file cannot be read or parsed,
/// or an environment override is invalid.
pub fn load_config() -> Result<PivotConfig, ConfigError> {
    let mut config = PivotConfig::default();

    if let Some(path) = default_config_path() {
        if path.exists() {
            load_file(&path, &mut config)?;
        }
    }

    apply_env(&mut config)?;
    Ok(config)
}

/// Load configuration from an explicit path (plus environment overrides)
///
/// # Errors
///
/// Unlike [`load_config`], a missing file here is a [`ConfigError::Read`].
pub fn load_config_from_path(path: &Path) -> Result<PivotConfig, ConfigError> {
    let mut config = PivotConfig::default();
    load_file(path, &mut config)?;
    apply_env(&mut config)?;
    Ok(config)
}

fn load_file(path: &Path, config: &mut PivotConfig) -> Result<(), ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: PivotToml = toml::from_str(&raw)?;
    parsed.apply(config);
    Ok(())
}

fn apply_env(config: &mut PivotConfig) -> Result<(), ConfigError> {
    if let Ok(value) = std::env::var("PIVOT_FALLBACK_CATEGORY") {
        config.fallback_category = parse_category(&value)?;
    }
    if let Ok(value) = std::env::var("PIVOT_ENABLE_ANALYTICS") {
        config.enable_analytics = value.parse().map_err(|_| {
            ConfigError::Validation(format!("PIVOT_ENABLE_ANALYTICS must be a bool, got {value:?}"))
        })?;
    }
    if let Ok(value) = std::env::var("PIVOT_INIT_TIMEOUT_SECS") {
        config.init_timeout = Duration::from_secs(parse_secs("PIVOT_INIT_TIMEOUT_SECS", &value)?);
    }
    if let Ok(value) = std::env::var("PIVOT_CLASSIFY_TIMEOUT_SECS") {
        config.classify_timeout =
            Duration::from_secs(parse_secs("PIVOT_CLASSIFY_TIMEOUT_SECS", &value)?);
    }
    Ok(())
}

fn parse_category(value: &str) -> Result<Category, ConfigError> {
    serde_json::from_value(serde_json::Value::String(value.to_lowercase())).map_err(|_| {
        ConfigError::Validation(format!("unknown category {value:?}"))
    })
}

fn parse_secs(name: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse().map_err(|_| {
        ConfigError::Validation(format!("{name} must be a non-negative integer, got {value:?}"))
    })
}
