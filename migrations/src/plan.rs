//! Filter, diff and sort composed into a single migration plan

use crate::ddl::SchemaAction;
use crate::diff::{DiffWarning, SchemaDiff, diff_schemas};
use crate::error::Error;
use crate::sorter::sort_owned;
use crate::traits::QueryType;

/// Schema assumed for actions that carry none
pub const DEFAULT_SCHEMA: &str = "public";

/// Options threaded through [`plan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanOptions {
    /// Keep GRANT statements
    pub include_grants: bool,
    /// Restrict to these schemas; empty means all
    pub schemas: Vec<String>,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            include_grants: true,
            schemas: Vec::new(),
        }
    }
}

impl PlanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_grants(mut self, include_grants: bool) -> Self {
        self.include_grants = include_grants;
        self
    }

    pub fn with_schemas<I, S>(mut self, schemas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schemas = schemas.into_iter().map(Into::into).collect();
        self
    }

    /// Whether `action` passes the grant and schema filters.
    ///
    /// Schema objects match on their own name; other unqualified actions count
    /// as `public`.
    pub fn admits(&self, action: &SchemaAction) -> bool {
        if !self.include_grants && action.query_type == QueryType::Grant {
            return false;
        }
        if self.schemas.is_empty() {
            return true;
        }
        let schema = match action.query_type {
            QueryType::Schema => action.object_name.as_deref(),
            _ => action.schema.as_deref().or(Some(DEFAULT_SCHEMA)),
        };
        schema.is_some_and(|schema| self.schemas.iter().any(|s| s == schema))
    }
}

/// Actions admitted by `options`, in input order
pub fn filter_actions(actions: &[SchemaAction], options: &PlanOptions) -> Vec<SchemaAction> {
    actions
        .iter()
        .filter(|action| options.admits(action))
        .cloned()
        .collect()
}

/// Sorted actions together with the objects that degraded while diffing
#[derive(Debug, Clone, Default)]
pub struct PlanReport {
    pub actions: Vec<SchemaAction>,
    pub warnings: Vec<DiffWarning>,
}

/// Dependency-ordered actions migrating `base` to `updated`.
pub fn plan(
    base: &[SchemaAction],
    updated: &[SchemaAction],
    options: &PlanOptions,
) -> Result<Vec<SchemaAction>, Error> {
    Ok(plan_report(base, updated, options)?.actions)
}

/// [`plan`], keeping the diff warnings.
pub fn plan_report(
    base: &[SchemaAction],
    updated: &[SchemaAction],
    options: &PlanOptions,
) -> Result<PlanReport, Error> {
    let base = filter_actions(base, options);
    let updated = filter_actions(updated, options);
    let SchemaDiff {
        actions, warnings, ..
    } = diff_schemas(&base, &updated);

    Ok(PlanReport {
        actions: sort_owned(actions)?,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant() -> SchemaAction {
        SchemaAction::new(QueryType::Grant, "grant_users", "GRANT SELECT ON users TO app;")
    }

    #[test]
    fn test_default_admits_everything() {
        let options = PlanOptions::default();
        assert!(options.admits(&grant()));
        assert!(options.admits(
            &SchemaAction::new(QueryType::BaseTable, "t", "CREATE TABLE t ();").with_schema("audit")
        ));
    }

    #[test]
    fn test_grants_can_be_excluded() {
        let options = PlanOptions::new().with_grants(false);
        assert!(!options.admits(&grant()));
    }

    #[test]
    fn test_schema_filter() {
        let options = PlanOptions::new().with_schemas(["public", "app"]);
        let audit = SchemaAction::new(QueryType::BaseTable, "log", "CREATE TABLE audit.log ();").with_schema("audit");
        let app = SchemaAction::new(QueryType::BaseTable, "users", "CREATE TABLE app.users ();").with_schema("app");
        let bare = SchemaAction::new(QueryType::BaseTable, "t", "CREATE TABLE t ();");
        let schema = SchemaAction::new(QueryType::Schema, "app", "CREATE SCHEMA app;");

        let kept = filter_actions(&[audit, app, bare, schema], &options);
        let names: Vec<_> = kept.iter().filter_map(|a| a.object_name.as_deref()).collect();
        assert_eq!(names, vec!["users", "t", "app"]);
    }

    #[test]
    fn test_plan_orders_created_objects() {
        let updated = vec![
            SchemaAction::new(QueryType::View, "active_users", "CREATE VIEW active_users AS SELECT * FROM users;")
                .with_dependencies(["users"]),
            SchemaAction::new(QueryType::BaseTable, "users", "CREATE TABLE users (id int);"),
        ];
        let planned = plan(&[], &updated, &PlanOptions::default()).unwrap();
        let names: Vec<_> = planned.iter().filter_map(|a| a.object_name.as_deref()).collect();
        assert_eq!(names, vec!["users", "active_users"]);
    }

    #[test]
    fn test_report_keeps_fallback_warnings() {
        let base = vec![SchemaAction::new(QueryType::BaseTable, "t", "CREATE TABLE t (a int);")];
        let updated = vec![
            SchemaAction::new(QueryType::View, "v", "CREATE VIEW v AS SELECT * FROM t;")
                .with_dependencies(["t"]),
            SchemaAction::new(QueryType::BaseTable, "t", "CREATE TABLE t (a int, b int);"),
        ];

        let report = plan_report(&base, &updated, &PlanOptions::default()).unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].fallback);
        assert_eq!(report.warnings[0].key.name, "t");

        let commands: Vec<_> = report.actions.iter().map(|a| a.command.as_str()).collect();
        assert_eq!(
            commands,
            vec![
                "DROP TABLE t;",
                "CREATE TABLE t (a int, b int);",
                "CREATE VIEW v AS SELECT * FROM t;",
            ]
        );
        assert_eq!(report.actions, plan(&base, &updated, &PlanOptions::default()).unwrap());
    }

    #[test]
    fn test_plan_reports_cycles() {
        let updated = vec![
            SchemaAction::new(QueryType::View, "a", "CREATE VIEW a AS SELECT * FROM b;").with_dependencies(["b"]),
            SchemaAction::new(QueryType::View, "b", "CREATE VIEW b AS SELECT * FROM a;").with_dependencies(["a"]),
        ];
        assert!(matches!(
            plan(&[], &updated, &PlanOptions::default()),
            Err(Error::Cyclic(_))
        ));
    }
}
