//! Common test utilities and helpers

#![allow(dead_code)]

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Scratch directory holding a config file and deal files for CLI runs
pub struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    pub fn new() -> Result<Self> {
        let context = Self {
            temp_dir: TempDir::new()?,
        };
        context.write_config("log_level = \"warn\"\n")?;
        Ok(context)
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Config file every CLI invocation should be pointed at
    pub fn config_path(&self) -> PathBuf {
        self.path().join("config.toml")
    }

    /// Replace the config file contents
    pub fn write_config(&self, content: &str) -> Result<PathBuf> {
        let path = self.config_path();
        fs::write(&path, content)?;
        Ok(path)
    }

    pub fn write_file(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.path().join(name);
        fs::write(&path, content)?;
        Ok(path)
    }

    pub fn write_deal(&self, deal: &serde_json::Value) -> Result<PathBuf> {
        self.write_file("deal.json", &serde_json::to_string_pretty(deal)?)
    }
}

/// A dealflow command isolated from the caller's environment
pub fn dealflow_cmd(context: &TestContext) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("dealflow").unwrap();
    cmd.env_remove("DEALFLOW_API_KEY")
        .env_remove("API_KEY")
        .env_remove("DEALFLOW_LOG_LEVEL")
        .env_remove("DEALFLOW_MODEL")
        .arg("--config")
        .arg(context.config_path());
    cmd
}

pub fn sample_deal_json() -> serde_json::Value {
    serde_json::json!({
        "deal_name": "Main Street Bakery",
        "purchase_price": 500000,
        "sde": 180000,
        "industry": "Food service"
    })
}
