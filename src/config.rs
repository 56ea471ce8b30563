//! Configuration management for teachme.
//!
//! Configuration is loaded from `~/.config/teachme/config.toml`. Every field
//! is optional; the server address can also come from `OLLAMA_URL`.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::bridge::ChatSettings;

/// Environment variable naming the Ollama server address.
pub const OLLAMA_URL_ENV: &str = "OLLAMA_URL";

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Inference server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Defaults for chat and ask.
    #[serde(default)]
    pub defaults: Defaults,
}

/// Inference server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Ollama host URL (default: http://localhost:11434).
    #[serde(default = "default_host")]
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
        }
    }
}

/// Model and sampling defaults, overridable per invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Defaults {
    /// Model name (default: qwen2.5:7b-instruct).
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature (default: 0.4).
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Output token budget (default: 512).
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "qwen2.5:7b-instruct".to_string()
}

fn default_temperature() -> f64 {
    0.4
}

fn default_max_tokens() -> u32 {
    512
}

/// Per-invocation overrides taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

impl Overrides {
    /// Resolve the chat settings: CLI > config file > built-in default.
    pub fn resolve(&self, config: &Config) -> ChatSettings {
        ChatSettings {
            model: self
                .model
                .clone()
                .unwrap_or_else(|| config.defaults.model.clone()),
            temperature: self.temperature.unwrap_or(config.defaults.temperature),
            max_tokens: self.max_tokens.unwrap_or(config.defaults.max_tokens),
        }
    }
}

impl Config {
    /// Get the config directory path.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join("teachme"))
            .context("Could not determine config directory")
    }

    /// Get the config file path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, using defaults if not found.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_toml(&contents)
                .with_context(|| format!("Invalid config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate configuration text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.defaults.max_tokens == 0 {
            bail!("defaults.max_tokens must be at least 1");
        }
        Ok(())
    }

    /// Save configuration to file.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Resolve the server address from the CLI flag, the environment and the
    /// config file, in that order.
    pub fn resolve_host(&self, cli: Option<&str>, env: Option<&str>) -> String {
        [cli, env]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|host| !host.is_empty())
            .unwrap_or(self.server.host.as_str())
            .trim_end_matches('/')
            .to_string()
    }

    /// Server address using the live `OLLAMA_URL` value.
    pub fn host(&self, cli: Option<&str>) -> String {
        let env = std::env::var(OLLAMA_URL_ENV).ok();
        self.resolve_host(cli, env.as_deref())
    }
}
