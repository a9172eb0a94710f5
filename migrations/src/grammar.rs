//! PostgreSQL naming conventions for constraints the parser left unnamed
//!
//! Default names use the bare table name, matching what PostgreSQL assigns.

use crate::utils::unqualified;

// =============================================================================
// Naming Conventions
// =============================================================================

/// `<table>_pkey`
pub fn default_name_for_pk(table: &str) -> String {
    format!("{}_pkey", unqualified(table))
}

/// `<table>_<columns>_fkey`
pub fn default_name_for_fk(table: &str, columns: &[String]) -> String {
    with_columns(table, columns, "fkey")
}

/// `<table>_<columns>_key`
pub fn default_name_for_unique(table: &str, columns: &[String]) -> String {
    with_columns(table, columns, "key")
}

/// `<table>_<columns>_check`, or `<table>_check` for table-level checks
pub fn default_name_for_check(table: &str, columns: &[String]) -> String {
    with_columns(table, columns, "check")
}

fn with_columns(table: &str, columns: &[String], suffix: &str) -> String {
    let table = unqualified(table);
    if columns.is_empty() {
        format!("{table}_{suffix}")
    } else {
        format!("{}_{}_{}", table, columns.join("_"), suffix)
    }
}
