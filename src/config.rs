//! Configuration management for Tabletalk
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::cli::Cli;
use crate::error::{Result, TabletalkError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Main configuration structure for Tabletalk
///
/// This structure holds all configuration needed for the client,
/// including backend connection settings and chat behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Agent backend connection settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Chat behavior settings
    #[serde(default)]
    pub chat: ChatSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            chat: ChatSettings::default(),
        }
    }
}

/// Agent backend configuration
///
/// Specifies where the remote natural-language-to-SQL agent lives and
/// how patient the HTTP client should be.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the agent API (including the version prefix)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout for backend requests (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000/api/v1".to_string()
}

fn default_timeout() -> u64 {
    120
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Chat behavior settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSettings {
    /// Greeting shown as the first assistant message of a fresh log
    #[serde(default = "default_greeting")]
    pub greeting: String,

    /// Maximum number of result rows rendered inline after an execution
    #[serde(default = "default_preview_rows")]
    pub result_preview_rows: usize,
}

fn default_greeting() -> String {
    "Hello! I am your SQL data analyst. Ask me anything about your data, \
     e.g. \"What are the five best selling albums?\""
        .to_string()
}

fn default_preview_rows() -> usize {
    20
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            greeting: default_greeting(),
            result_preview_rows: default_preview_rows(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file with CLI overrides applied
    ///
    /// A missing file is not an error: defaults are used so the client
    /// works out of the box against a local backend.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML configuration file
    /// * `cli` - Parsed command-line arguments whose overrides win over the file
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tabletalk::cli::Cli;
    /// use tabletalk::config::Config;
    ///
    /// let cli = Cli::parse_args();
    /// let config = Config::load("config/config.yaml", &cli).unwrap();
    /// ```
    pub fn load(path: impl AsRef<Path>, cli: &Cli) -> Result<Self> {
        let path = path.as_ref();

        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            serde_yaml::from_str(&contents)
                .map_err(|e| TabletalkError::Config(format!("Failed to parse {:?}: {}", path, e)))?
        } else {
            tracing::debug!("Config file {:?} not found, using defaults", path);
            Self::default()
        };

        if let Some(url) = &cli.backend_url {
            config.backend.base_url = url.clone();
        }

        Ok(config)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns a `Config` error if the backend URL does not parse, the
    /// timeout is zero, or the preview size is zero.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.backend.base_url).map_err(|e| {
            TabletalkError::Config(format!(
                "Invalid backend base_url '{}': {}",
                self.backend.base_url, e
            ))
        })?;

        if self.backend.timeout_seconds == 0 {
            return Err(TabletalkError::Config(
                "backend.timeout_seconds must be greater than zero".to_string(),
            )
            .into());
        }

        if self.chat.result_preview_rows == 0 {
            return Err(TabletalkError::Config(
                "chat.result_preview_rows must be greater than zero".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
