//! Error types for diffing, sorting and rendering

use crate::traits::QueryType;

/// Top-level error for plan generation and output rendering
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Cyclic(#[from] CyclicDependencyError),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The dependency graph could not be ordered.
///
/// `nodes` lists every node whose in-degree never reached zero, in input order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Cyclic dependency detected between: {}", .nodes.join(", "))]
pub struct CyclicDependencyError {
    pub nodes: Vec<String>,
}

/// Failure of one object's structural comparison.
///
/// Never escapes the diff engine; the object degrades to the generic
/// drop-and-recreate strategy and the error is recorded as a fallback.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructuralDiffError {
    #[error("{query_type} {name} has no {expected} detail")]
    MissingDetail {
        query_type: QueryType,
        name: String,
        expected: &'static str,
    },
    #[error("{query_type} {name} carries {found} detail, expected {expected}")]
    MismatchedDetail {
        query_type: QueryType,
        name: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("constraint on {table} is incomplete: {reason}")]
    IncompleteConstraint { table: String, reason: String },
    #[error("{0} statement has no object name")]
    Unnamed(QueryType),
    #[error("no structural differ for {0}")]
    Unsupported(QueryType),
}
