//! Configuration for the pgcompose CLI
//!
//! Handles loading `pgcompose.toml`. Every key is optional and command-line
//! flags take precedence over file values.

use pgcompose_migrations::OutputFormat;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "pgcompose.toml";

// ============================================================================
// Configuration
// ============================================================================

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Schemas to restrict the plan to; empty means all
    pub schemas: Vec<String>,
    /// Keep GRANT statements (unset means omit)
    pub grants: Option<bool>,
    pub output_format: OutputFormat,
    /// Deployment file path
    pub deploy: Option<PathBuf>,
}

// ============================================================================
// Config implementation
// ============================================================================

impl Config {
    /// Load from the default config file, falling back to defaults when it
    /// does not exist
    pub fn load() -> Result<Self, Error> {
        match Self::load_from(Path::new(CONFIG_FILE)) {
            Err(Error::NotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    /// Load from specific path
    pub fn load_from(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(path.into())
            } else {
                Error::Io(path.into(), e)
            }
        })?;

        toml::from_str(&content).map_err(|e| Error::Parse(path.into(), e))
    }

    pub fn include_grants(&self) -> bool {
        self.grants.unwrap_or(false)
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse {}: {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),
}

pub type ConfigError = Error;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg, Config::default());
        assert!(!cfg.include_grants());
        assert_eq!(cfg.output_format, OutputFormat::Sql);
    }

    #[test]
    fn full() {
        let cfg: Config = toml::from_str(
            r#"
            schemas = ["public", "app"]
            grants = true
            output_format = "json"
            deploy = "out/migration.sql"
        "#,
        )
        .unwrap();
        assert_eq!(cfg.schemas, vec!["public", "app"]);
        assert!(cfg.include_grants());
        assert_eq!(cfg.output_format, OutputFormat::Json);
        assert_eq!(cfg.deploy, Some(PathBuf::from("out/migration.sql")));
    }

    #[test]
    fn unknown_key_rejected() {
        assert!(toml::from_str::<Config>("dialect = \"postgresql\"").is_err());
    }

    #[test]
    fn unknown_format_rejected() {
        assert!(toml::from_str::<Config>("output_format = \"yaml\"").is_err());
    }

    #[test]
    fn missing_file() {
        let path = Path::new("definitely/not/here/pgcompose.toml");
        assert!(matches!(Config::load_from(path), Err(Error::NotFound(_))));
    }
}
