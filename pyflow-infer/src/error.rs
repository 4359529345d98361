//! Hard failures that abort an analysis call
//!
//! Everything else is a [`crate::diagnostics::Diagnostic`].

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Module loader failed for {module}: {message}")]
    Loader { module: String, message: String },

    #[error("Invalid configuration: {message}")]
    Config { message: String },
}

impl AnalysisError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn loader(module: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Loader {
            module: module.into(),
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
