//! Analyzer options

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerOptions {
    /// Maximum memo entries ("arrows") kept per function
    #[serde(default = "default_max_arrows")]
    pub max_arrows: usize,

    /// Report never-referenced variables and parameters
    #[serde(default)]
    pub report_unused: bool,

    /// Roots searched by the module loader, in order
    #[serde(default)]
    pub search_path: Vec<PathBuf>,

    /// Suppress progress logging
    #[serde(default)]
    pub quiet: bool,

    /// Apply functions that were never called with all-unknown arguments
    #[serde(default = "default_true")]
    pub force_uncalled: bool,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            max_arrows: default_max_arrows(),
            report_unused: false,
            search_path: Vec::new(),
            quiet: false,
            force_uncalled: default_true(),
        }
    }
}

impl AnalyzerOptions {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let options: AnalyzerOptions =
            toml::from_str(text).map_err(|e| AnalysisError::config(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| AnalysisError::io(path, e))?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_arrows == 0 {
            return Err(AnalysisError::config("max_arrows must be at least 1"));
        }
        Ok(())
    }

    pub fn with_search_path(mut self, roots: impl IntoIterator<Item = PathBuf>) -> Self {
        self.search_path.extend(roots);
        self
    }
}

fn default_max_arrows() -> usize {
    5
}

fn default_true() -> bool {
    true
}
