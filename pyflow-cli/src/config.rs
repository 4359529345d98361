//! Configuration management

use anyhow::{Context, Result};
use pyflow_infer::AnalyzerOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory
pub const CONFIG_FILE: &str = "pyflow.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Colored terminal output
    #[serde(default = "default_true")]
    pub color: bool,

    /// `check` also prints the inferred types of top-level names
    #[serde(default)]
    pub show_types: bool,

    /// Include underscore names when printing types
    #[serde(default)]
    pub show_private: bool,

    /// Engine options, the `[analyzer]` table
    #[serde(default)]
    pub analyzer: AnalyzerOptions,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            color: default_true(),
            show_types: false,
            show_private: false,
            analyzer: AnalyzerOptions::default(),
        }
    }
}

impl CliConfig {
    /// Load configuration from file.
    ///
    /// Without an explicit path, `./pyflow.toml` is tried first, then the user
    /// configuration directory. A missing file yields the defaults.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config_path = match config_path {
            Some(path) => path.to_owned(),
            None => match Self::default_config_path() {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: CliConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config
            .analyzer
            .validate()
            .with_context(|| format!("Invalid analyzer options in {}", config_path.display()))?;

        Ok(config)
    }

    /// Save configuration to file
    #[allow(dead_code)]
    pub fn save(&self, config_path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    fn default_config_path() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE);
        if local.exists() {
            return Some(local);
        }
        dirs::config_dir().map(|dir| dir.join("pyflow").join("config.toml"))
    }
}

fn default_true() -> bool {
    true
}
