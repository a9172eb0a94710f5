//! Error types for the CLI

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

/// CLI errors
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Source file could not be read
    #[error("failed to read {}: {}", .0.display(), .1)]
    Read(PathBuf, #[source] std::io::Error),

    /// Source file is not a JSON array of schema actions
    #[error("failed to parse {}: {}", .0.display(), .1)]
    Parse(PathBuf, #[source] serde_json::Error),

    /// Planning or rendering failed
    #[error(transparent)]
    Plan(#[from] pgcompose_migrations::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}
