//! Configuration management
//!
//! Values are layered: built-in defaults, then `config.toml` (from the
//! platform config directory or an explicit path), then environment variables.

use crate::error::{Error, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub mod loader;

pub use loader::ConfigLoader;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_THINKING_MODEL: &str = "gemini-2.5-pro";

/// Get the directory holding `config.toml`
pub fn get_global_config_dir() -> Result<PathBuf> {
    ProjectDirs::from("com", "dealflow", "dealflow")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub gemini: GeminiConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub default_model: String,
    pub thinking_model: String,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            thinking_model: DEFAULT_THINKING_MODEL.to_string(),
            request_timeout: Duration::from_secs(120),
        }
    }
}

impl GeminiConfig {
    /// The configured key, unless it is missing or blank
    pub fn usable_api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.trim().is_empty())
    }
}

/// Optional catalog files replacing the built-in agents and workflows
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    pub agents: Option<PathBuf>,
    pub workflows: Option<PathBuf>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge_env_vars(&mut self) {
        self.merge_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable source
    pub fn merge_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(api_key) = non_blank("DEALFLOW_API_KEY").or_else(|| non_blank("API_KEY")) {
            self.gemini.api_key = Some(api_key);
        }

        if let Some(log_level) = lookup("DEALFLOW_LOG_LEVEL") {
            self.log_level = Some(log_level);
        }

        if let Some(model) = lookup("DEALFLOW_MODEL") {
            self.gemini.default_model = model;
        }
    }

    pub fn get_log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    pub fn get_api_key(&self) -> Option<&str> {
        self.gemini.usable_api_key()
    }
}
