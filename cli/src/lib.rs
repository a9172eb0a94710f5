//! pgcompose CLI - Command-line interface for pgcompose schema diffs
//!
//! Compares two schema sources (JSON arrays of parsed DDL statements) and
//! prints, or writes, the ordered statements that migrate one to the other.
//!
//! # Usage
//!
//! ```text
//! pgcompose base.json updated.json
//! pgcompose base.json part1.json,part2.json --schemas public,app
//! pgcompose base.json updated.json --deploy migration.sql --prod
//! ```
//!
//! # Configuration
//!
//! An optional `pgcompose.toml` in the working directory supplies defaults
//! for the command-line flags:
//!
//! ```toml
//! schemas = ["public", "app"]
//! grants = true
//! output_format = "sql"
//! deploy = "migrations/next.sql"
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod source;

pub use config::{Config, Error as ConfigError};
pub use error::CliError;
