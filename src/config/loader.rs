use super::{get_global_config_dir, Config};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

const CONFIG_FILE_NAME: &str = "config.toml";

/// Loads layered configuration
pub struct ConfigLoader {
    explicit_path: Option<PathBuf>,
    apply_env: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            explicit_path: None,
            apply_env: true,
        }
    }

    /// Read this file instead of the platform default; it must exist
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_path = Some(path.into());
        self
    }

    /// Skip environment overrides
    pub fn without_env(mut self) -> Self {
        self.apply_env = false;
        self
    }

    pub async fn load(&self) -> Result<Config> {
        let mut config = match &self.explicit_path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                Self::load_file(path).await?
            }
            None => {
                let default_path = get_global_config_dir()
                    .map(|dir| dir.join(CONFIG_FILE_NAME))
                    .ok();
                match default_path {
                    Some(path) if path.exists() => Self::load_file(&path).await?,
                    _ => Config::new(),
                }
            }
        };

        if self.apply_env {
            config.merge_env_vars();
        }

        Ok(config)
    }

    async fn load_file(path: &Path) -> Result<Config> {
        tracing::debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path).await?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Config> {
        Ok(toml::from_str(content)?)
    }
}
