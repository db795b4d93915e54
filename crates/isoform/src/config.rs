//! Configuration management for isoform.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::analysis::RetryPolicy;
use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "isoform";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "form.db";

/// Default exports directory name (under the data directory).
const EXPORT_DIR_NAME: &str = "reports";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `ISOFORM_`)
/// 2. TOML config file at `~/.config/isoform/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// AI provider configuration.
    pub ai: AiConfig,
    /// Photo normalization configuration.
    pub image: ImageConfig,
    /// Report export configuration.
    pub export: ExportConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/isoform/form.db`
    pub database_path: Option<PathBuf>,
}

/// AI provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Base URL of the generative-language API.
    pub endpoint: String,
    /// Model name used for both incident and MEDIC analysis.
    pub model: String,
    /// API key. Falls back to the `GEMINI_API_KEY` environment variable.
    pub api_key: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Total attempts per analysis (1 disables retry).
    pub max_attempts: u32,
    /// Backoff before the first retry; doubles on each further retry.
    pub base_backoff_ms: u64,
}

/// Photo normalization configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Maximum output width in pixels.
    pub max_width: u32,
    /// JPEG quality, 1-100.
    pub jpeg_quality: u8,
}

/// Export-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory exported reports are written to.
    /// Defaults to `~/.local/share/isoform/reports`
    pub output_dir: Option<PathBuf>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-3-pro-preview".to_string(),
            api_key: None,
            timeout_secs: 60,
            max_attempts: 1,
            base_backoff_ms: 1000,
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_width: 1024,
            jpeg_quality: 80,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("ISOFORM_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.image.max_width == 0 {
            return Err(Error::ConfigValidation {
                message: "image.max_width must be greater than 0".to_string(),
            });
        }

        if !(1..=100).contains(&self.image.jpeg_quality) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "image.jpeg_quality ({}) must be between 1 and 100",
                    self.image.jpeg_quality
                ),
            });
        }

        if self.ai.timeout_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "ai.timeout_secs must be greater than 0".to_string(),
            });
        }

        if self.ai.max_attempts == 0 {
            return Err(Error::ConfigValidation {
                message: "ai.max_attempts must be at least 1".to_string(),
            });
        }

        if self.ai.endpoint.trim().is_empty() || self.ai.model.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "ai.endpoint and ai.model must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the export directory, resolving defaults if not set.
    #[must_use]
    pub fn export_dir(&self) -> PathBuf {
        self.export
            .output_dir
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(EXPORT_DIR_NAME))
    }

    /// Get the AI request timeout as a Duration.
    #[must_use]
    pub fn ai_timeout(&self) -> Duration {
        Duration::from_secs(self.ai.timeout_secs)
    }

    /// Get the configured retry policy for AI calls.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.ai.max_attempts,
            base_backoff_ms: self.ai.base_backoff_ms,
        }
    }

    /// Resolve the API key from config, then the `GEMINI_API_KEY` variable.
    #[must_use]
    pub fn api_key(&self) -> Option<String> {
        self.ai
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .filter(|key| !key.trim().is_empty())
    }
}
