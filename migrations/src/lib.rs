//! pgcompose migrations - schema diff and migration ordering for PostgreSQL
//!
//! This crate compares two schema snapshots, each a list of parsed DDL
//! statements ([`SchemaAction`]), and produces a dependency-ordered list of
//! CREATE/ALTER/DROP/GRANT statements that migrates one to the other:
//!
//! - Content hashing over normalized SQL for change detection
//! - Structural differs for tables, views, routines and grants
//! - Drop-and-recreate fallback for everything else
//! - Topological sorting with cycle detection
//!
//! # Planning a migration
//!
//! ```
//! use pgcompose_migrations::{
//!     PlanOptions, QueryType, SchemaAction, TableColumn, TableDetail, plan, to_sql,
//! };
//!
//! let users = |detail: TableDetail, sql: &str| {
//!     SchemaAction::new(QueryType::BaseTable, "users", sql).with_detail(detail)
//! };
//!
//! let base = vec![users(
//!     TableDetail::new().column(TableColumn::new("id", "int")),
//!     "CREATE TABLE users (id int);",
//! )];
//! let updated = vec![users(
//!     TableDetail::new()
//!         .column(TableColumn::new("id", "int"))
//!         .column(TableColumn::new("email", "text")),
//!     "CREATE TABLE users (id int, email text);",
//! )];
//!
//! let actions = plan(&base, &updated, &PlanOptions::default())?;
//! assert_eq!(to_sql(&actions), "ALTER TABLE users ADD COLUMN email TEXT;");
//! # Ok::<(), pgcompose_migrations::Error>(())
//! ```
//!
//! # Feature flags
//!
//! - `tracing` - emit diff classification, fallback and sort events through
//!   the `tracing` crate

pub mod collection;
pub mod ddl;
pub mod diff;
pub mod error;
pub mod grammar;
pub mod merge;
pub mod output;
pub mod plan;
pub mod sorter;
pub mod statements;
mod tracing;
pub mod traits;
pub mod utils;

pub use collection::{Collection, EntityDiff, diff_collections};
pub use ddl::{
    AttachedDetail, ConstraintKind, Detail, ForeignKeyTarget, FunctionParameter, GrantDetail,
    ParameterMode, RoutineDetail, SchemaAction, TableColumn, TableConstraint, TableDetail,
};
pub use diff::{DiffWarning, ObjectChange, SchemaDiff, diff_schemas};
pub use error::{CyclicDependencyError, Error, StructuralDiffError};
pub use merge::{merge, merge_all};
pub use output::{JsonRecord, OutputFormat, render, to_records, to_sql};
pub use plan::{PlanOptions, PlanReport, filter_actions, plan, plan_report};
pub use sorter::{sort_actions, sort_owned};
pub use traits::{DiffType, Entity, EntityKey, QueryType, ResourceType};
pub use utils::{content_hash, normalize, sequence_hash};
