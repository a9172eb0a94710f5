//! Loading schema sources
//!
//! A source argument names one or more JSON files separated by commas. Each
//! file holds an array of schema action records; the files are merged in the
//! order given.

use std::path::{Path, PathBuf};

use pgcompose_migrations::{SchemaAction, merge_all};

use crate::error::CliError;

/// Paths named by a source argument, blanks skipped
pub fn split_sources(arg: &str) -> Vec<PathBuf> {
    arg.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Read one record file
pub fn load_file(path: &Path) -> Result<Vec<SchemaAction>, CliError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| CliError::Read(path.to_path_buf(), e))?;
    serde_json::from_str(&content).map_err(|e| CliError::Parse(path.to_path_buf(), e))
}

/// Read and merge every file named by `arg`
pub fn load(arg: &str) -> Result<Vec<SchemaAction>, CliError> {
    let paths = split_sources(arg);
    if paths.is_empty() {
        return Err(CliError::Other(format!("no source files in '{arg}'")));
    }

    let sources = paths
        .iter()
        .map(|path| load_file(path))
        .collect::<Result<Vec<_>, _>>()?;
    let merged = merge_all(sources.iter().map(Vec::as_slice));

    tracing::debug!(
        target: "pgcompose.source",
        files = paths.len(),
        actions = merged.len(),
        "loaded source {arg}"
    );
    Ok(merged)
}
