//! Statement normalization, content hashing and small SQL text helpers

use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::LazyLock;

static LINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"--[^\n]*").expect("valid line comment pattern"));
static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid block comment pattern"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));
static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*([,()])\s*").expect("valid punctuation pattern"));

// =============================================================================
// Hash Functions
// =============================================================================

/// Canonicalize statement text for identity comparison.
///
/// Strips `--` and `/* */` comments, collapses whitespace, removes whitespace
/// around commas and parentheses, trims and uppercases. Case folding applies to
/// string literals and identifiers as well.
pub fn normalize(sql: &str) -> String {
    let sql = LINE_COMMENT.replace_all(sql, "");
    let sql = BLOCK_COMMENT.replace_all(&sql, "");
    let sql = WHITESPACE.replace_all(&sql, " ");
    let sql = PUNCTUATION.replace_all(&sql, "$1");
    sql.trim().to_uppercase()
}

/// Lowercase hex SHA-256 of the raw input
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Content hash of a statement: `SHA256(normalize(sql))`
pub fn content_hash(sql: &str) -> String {
    sha256_hex(&normalize(sql))
}

/// Identity for the `index`-th statement of a synthesized sequence.
///
/// A single structural diff can expand into several actions; each one gets its
/// own hash derived from the hash of the object it came from.
pub fn sequence_hash(source_hash: &str, index: usize, statement: &str) -> String {
    content_hash(&format!("{source_hash}{index}{statement}"))
}

// =============================================================================
// String Utilities
// =============================================================================

/// Ensure a statement ends with exactly one trailing semicolon
pub fn ensure_semicolon(sql: &str) -> String {
    let trimmed = sql.trim();
    if trimmed.ends_with(';') {
        trimmed.to_string()
    } else {
        format!("{trimmed};")
    }
}

/// Rewrite the first case-insensitive `CREATE <object>` into
/// `CREATE OR REPLACE <object>`.
///
/// `object` is a keyword such as `VIEW` or `FUNCTION`. Statements that already
/// say `OR REPLACE` (or never say `CREATE <object>`) are returned unchanged.
pub fn create_or_replace(sql: &str, object: &str) -> String {
    let pattern = format!(r"(?i)\bCREATE\s+{}\b", regex::escape(object));
    match Regex::new(&pattern) {
        Ok(re) => re
            .replacen(sql, 1, format!("CREATE OR REPLACE {object}").as_str())
            .into_owned(),
        Err(_) => sql.to_string(),
    }
}

/// Join identifiers with `", "`
pub fn comma_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Last dot-separated segment of a possibly qualified name
pub fn unqualified(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}
