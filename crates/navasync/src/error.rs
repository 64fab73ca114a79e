//! Error types for the batch pipeline
//!
//! Only errors that abort a run live here. Per-file problems during the
//! parallel phase are recorded as `PageOutcome::Failed` instead.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, NavAsyncError>;

#[derive(Debug, Error)]
pub enum NavAsyncError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to load config file {path}: {source}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Navigation element {selector} not found in source page {path}")]
    NavigationNotFound { path: PathBuf, selector: String },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: dom::DomError,
    },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Worker pool error: {0}")]
    Worker(String),
}

impl NavAsyncError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, source: dom::DomError) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }
}
