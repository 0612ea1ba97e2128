//! TOML Configuration File Support
//!
//! Configuration for the conductor and its HTTP client, loaded from a TOML file
//! at `~/.config/session-conductor/conductor.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (see [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # XDG Base Directory Compliance
//!
//! The configuration file follows XDG Base Directory specification:
//! - `$XDG_CONFIG_HOME/session-conductor/conductor.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! [api]
//! base_url = "https://chat.example.com"
//! token = "..."
//! timeout_secs = 30
//!
//! [transcript]
//! page_size = 20
//! near_top_threshold = 48
//! greeting = "Hello! How can I help you today?"
//!
//! [notices]
//! duration_ms = 3000
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pagination::PaginationConfig;
use crate::state::{StateSettings, DEFAULT_GREETING};

/// Default API endpoint (a local development backend)
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// API section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiToml {
    /// Base URL of the chat backend
    pub base_url: Option<String>,

    /// Bearer token
    pub token: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// Transcript section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptToml {
    /// Messages per page
    pub page_size: Option<u32>,

    /// Scroll offset that triggers an older-page load
    pub near_top_threshold: Option<u32>,

    /// Greeting shown in a new chat
    pub greeting: Option<String>,
}

/// Notices section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NoticesToml {
    /// How long transient notifications stay visible
    pub duration_ms: Option<u64>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConductorToml {
    /// API configuration section
    pub api: ApiToml,

    /// Transcript configuration section
    pub transcript: TranscriptToml,

    /// Notices configuration section
    pub notices: NoticesToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Where and how to reach the chat backend
#[derive(Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL (scheme, host, optional port)
    pub base_url: String,
    /// Bearer token, if the backend requires one
    pub token: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout_secs: 30,
        }
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Centralized configuration for the Conductor
///
/// Use [`load_config`] to load configuration with proper priority handling.
#[derive(Clone, Debug)]
pub struct ConductorConfig {
    /// Backend connection
    pub api: ApiConfig,

    /// Page size and near-top trigger
    pub pagination: PaginationConfig,

    /// Greeting shown in a new chat
    pub greeting: String,

    /// Lifetime of transient notifications in milliseconds
    pub notice_duration_ms: u64,

    /// Capacity of the conductor-to-surface channel
    pub channel_capacity: usize,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for ConductorConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            pagination: PaginationConfig::default(),
            greeting: DEFAULT_GREETING.to_string(),
            notice_duration_ms: 3000,
            channel_capacity: 100,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl ConductorConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Settings the controller state is built from
    #[must_use]
    pub fn state_settings(&self) -> StateSettings {
        StateSettings {
            greeting: self.greeting.clone(),
            pagination: self.pagination,
        }
    }

    /// Check values that would make the conductor misbehave
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "api.base_url must not be empty".to_string(),
            ));
        }
        if self.pagination.page_size == 0 {
            return Err(ConfigError::ValidationError(
                "transcript.page_size must be at least 1".to_string(),
            ));
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "api.timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "channel capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/session-conductor/conductor.toml` or
/// `~/.config/session-conductor/conductor.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("session-conductor").join("conductor.toml"))
}

/// Load configuration from all sources with proper priority
///
/// CLI overrides are not handled here; apply [`ConfigOverrides`] after.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed.
/// A missing config file is not an error (defaults are used).
pub fn load_config() -> Result<ConductorConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<ConductorConfig, ConfigError> {
    let mut config = load_file_config(path)?;
    apply_env_config_with(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Defaults overlaid with the file at `path`, if it exists
fn load_file_config(path: Option<PathBuf>) -> Result<ConductorConfig, ConfigError> {
    let mut config = ConductorConfig::default();

    let Some(config_path) = path else {
        return Ok(config);
    };

    if !config_path.exists() {
        tracing::debug!(
            path = %config_path.display(),
            "Config file not found, using defaults"
        );
        return Ok(config);
    }

    let toml_content =
        std::fs::read_to_string(&config_path).map_err(|e| ConfigError::ReadError {
            path: config_path.clone(),
            source: e,
        })?;

    let toml_config: ConductorToml = toml::from_str(&toml_content)?;
    apply_toml_config(&mut config, &toml_config);
    config.config_file_path = Some(config_path.clone());
    config.source = ConfigSource::File;

    tracing::info!(
        path = %config_path.display(),
        "Loaded configuration from file"
    );
    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut ConductorConfig, toml: &ConductorToml) {
    // API settings
    if let Some(ref url) = toml.api.base_url {
        config.api.base_url = url.clone();
    }
    if toml.api.token.is_some() {
        config.api.token = toml.api.token.clone();
    }
    if let Some(timeout) = toml.api.timeout_secs {
        config.api.timeout_secs = timeout;
    }

    // Transcript settings
    if let Some(size) = toml.transcript.page_size {
        config.pagination.page_size = size;
    }
    if let Some(threshold) = toml.transcript.near_top_threshold {
        config.pagination.near_top_threshold = threshold;
    }
    if let Some(ref greeting) = toml.transcript.greeting {
        config.greeting = greeting.clone();
    }

    // Notice settings
    if let Some(duration) = toml.notices.duration_ms {
        config.notice_duration_ms = duration;
    }
}

/// Apply environment overrides read through `lookup`
///
/// Unparseable numbers are ignored with a warning and leave the value as is.
pub fn apply_env_config_with<F>(config: &mut ConductorConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    fn parsed<T: std::str::FromStr>(key: &str, raw: &str) -> Option<T> {
        let value = raw.trim().parse().ok();
        if value.is_none() {
            tracing::warn!(key, value = raw, "Ignoring unparseable environment value");
        }
        value
    }

    if let Some(url) = lookup("CONDUCTOR_API_URL") {
        config.api.base_url = url;
        config.source = ConfigSource::Env;
    }
    if let Some(token) = lookup("CONDUCTOR_API_TOKEN") {
        config.api.token = Some(token).filter(|t| !t.is_empty());
        config.source = ConfigSource::Env;
    }
    if let Some(raw) = lookup("CONDUCTOR_TIMEOUT_SECS") {
        if let Some(secs) = parsed("CONDUCTOR_TIMEOUT_SECS", &raw) {
            config.api.timeout_secs = secs;
            config.source = ConfigSource::Env;
        }
    }
    if let Some(raw) = lookup("CONDUCTOR_PAGE_SIZE") {
        if let Some(size) = parsed("CONDUCTOR_PAGE_SIZE", &raw) {
            config.pagination.page_size = size;
            config.source = ConfigSource::Env;
        }
    }
    if let Some(raw) = lookup("CONDUCTOR_NEAR_TOP_THRESHOLD") {
        if let Some(threshold) = parsed("CONDUCTOR_NEAR_TOP_THRESHOLD", &raw) {
            config.pagination.near_top_threshold = threshold;
            config.source = ConfigSource::Env;
        }
    }
    if let Some(greeting) = lookup("CONDUCTOR_GREETING") {
        config.greeting = greeting;
        config.source = ConfigSource::Env;
    }
    if let Some(raw) = lookup("CONDUCTOR_NOTICE_MS") {
        if let Some(ms) = parsed("CONDUCTOR_NOTICE_MS", &raw) {
            config.notice_duration_ms = ms;
            config.source = ConfigSource::Env;
        }
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// API base URL override
    pub api_url: Option<String>,

    /// Bearer token override
    pub token: Option<String>,

    /// Page size override
    pub page_size: Option<u32>,

    /// Request timeout override (seconds)
    pub timeout_secs: Option<u64>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set API base URL override
    #[must_use]
    pub fn with_api_url(mut self, url: String) -> Self {
        self.api_url = Some(url);
        self
    }

    /// Set bearer token override
    #[must_use]
    pub fn with_token(mut self, token: String) -> Self {
        self.token = Some(token);
        self
    }

    /// Set page size override
    #[must_use]
    pub fn with_page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Set request timeout override
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut ConductorConfig) {
        if self.api_url.is_some()
            || self.token.is_some()
            || self.page_size.is_some()
            || self.timeout_secs.is_some()
        {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref url) = self.api_url {
            config.api.base_url = url.clone();
        }
        if let Some(ref token) = self.token {
            config.api.token = Some(token.clone());
        }
        if let Some(size) = self.page_size {
            config.pagination.page_size = size;
        }
        if let Some(secs) = self.timeout_secs {
            config.api.timeout_secs = secs;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
