//! Configuration management for Reelkit
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{ReelkitError, Result};
use crate::generation::{Platform, Tone};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for Reelkit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend endpoints and transport bounds
    #[serde(default)]
    pub backend: BackendConfig,
    /// Durable storage for the auth token
    #[serde(default)]
    pub storage: StorageConfig,
    /// Defaults for AI generation requests
    #[serde(default)]
    pub generation: GenerationConfig,
}

/// Backend configuration
///
/// The identity API and the AI engine are separate hosts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the account/identity API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Base URL of the AI engine
    #[serde(default = "default_ai_engine_url")]
    pub ai_engine_url: String,

    /// Upper bound for a single backend request (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_api_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_ai_engine_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl BackendConfig {
    /// Request timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            ai_engine_url: default_ai_engine_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Where the auth token is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// OS native credential store
    #[default]
    Keyring,
    /// Process-local map; nothing survives exit
    Memory,
}

impl std::str::FromStr for StorageKind {
    type Err = ReelkitError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "keyring" => Ok(Self::Keyring),
            "memory" => Ok(Self::Memory),
            other => Err(ReelkitError::Config(format!(
                "Invalid storage kind: {}. Must be one of: keyring, memory",
                other
            ))),
        }
    }
}

/// Durable storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage implementation
    #[serde(default)]
    pub kind: StorageKind,

    /// Keyring service name
    #[serde(default = "default_service")]
    pub service: String,
}

fn default_service() -> String {
    "reelkit".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: StorageKind::default(),
            service: default_service(),
        }
    }
}

/// Defaults applied to generation requests when the caller leaves them out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Platform used when none is given
    #[serde(default = "default_platform")]
    pub default_platform: Platform,

    /// Caption tone
    #[serde(default)]
    pub tone: Tone,

    /// Number of caption variations to request
    #[serde(default = "default_caption_variations")]
    pub caption_variations: u32,

    /// Number of hashtags to request
    #[serde(default = "default_hashtag_count")]
    pub hashtag_count: u32,

    /// Timezone for posting-time suggestions
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Ask the backend to embed provenance metadata after watermark removal
    #[serde(default = "default_add_provenance")]
    pub add_provenance: bool,
}

fn default_platform() -> Platform {
    Platform::YoutubeShorts
}

fn default_caption_variations() -> u32 {
    3
}

fn default_hashtag_count() -> u32 {
    10
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_add_provenance() -> bool {
    true
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            default_platform: default_platform(),
            tone: Tone::default(),
            caption_variations: default_caption_variations(),
            hashtag_count: default_hashtag_count(),
            timezone: default_timezone(),
            add_provenance: default_add_provenance(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ReelkitError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ReelkitError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(api_url) = std::env::var("REELKIT_API_URL") {
            self.backend.api_url = api_url;
        }

        if let Ok(ai_engine_url) = std::env::var("REELKIT_AI_ENGINE_URL") {
            self.backend.ai_engine_url = ai_engine_url;
        }

        if let Ok(timeout) = std::env::var("REELKIT_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.backend.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid REELKIT_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(kind) = std::env::var("REELKIT_STORAGE_KIND") {
            match kind.parse() {
                Ok(value) => self.storage.kind = value,
                Err(e) => tracing::warn!("Invalid REELKIT_STORAGE_KIND: {}", e),
            }
        }

        if let Ok(platform) = std::env::var("REELKIT_DEFAULT_PLATFORM") {
            match platform.parse() {
                Ok(value) => self.generation.default_platform = value,
                Err(e) => tracing::warn!("Invalid REELKIT_DEFAULT_PLATFORM: {}", e),
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.ephemeral {
            tracing::debug!("Ephemeral mode: auth token kept in memory only");
            self.storage.kind = StorageKind::Memory;
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any value is out of range or a URL does not parse
    pub fn validate(&self) -> Result<()> {
        validate_url("backend.api_url", &self.backend.api_url)?;
        validate_url("backend.ai_engine_url", &self.backend.ai_engine_url)?;

        if self.backend.timeout_seconds == 0 || self.backend.timeout_seconds > 300 {
            return Err(ReelkitError::Config(
                "backend.timeout_seconds must be between 1 and 300".to_string(),
            )
            .into());
        }

        if self.storage.service.trim().is_empty() {
            return Err(
                ReelkitError::Config("storage.service cannot be empty".to_string()).into(),
            );
        }

        if !(1..=10).contains(&self.generation.caption_variations) {
            return Err(ReelkitError::Config(
                "generation.caption_variations must be between 1 and 10".to_string(),
            )
            .into());
        }

        if !(1..=30).contains(&self.generation.hashtag_count) {
            return Err(ReelkitError::Config(
                "generation.hashtag_count must be between 1 and 30".to_string(),
            )
            .into());
        }

        if self.generation.timezone.trim().is_empty() {
            return Err(
                ReelkitError::Config("generation.timezone cannot be empty".to_string()).into(),
            );
        }

        Ok(())
    }
}

fn validate_url(field: &str, value: &str) -> Result<()> {
    let parsed = url::Url::parse(value)
        .map_err(|e| ReelkitError::Config(format!("{} is not a valid URL: {}", field, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ReelkitError::Config(format!(
            "{} must use http or https, got {}",
            field, other
        ))
        .into()),
    }
}
