//! Errors raised while loading story tables and configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from loading configuration or metadata tables.
#[derive(Debug, Error)]
pub enum RulesError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid table: {0}")]
    InvalidTable(String),
}
