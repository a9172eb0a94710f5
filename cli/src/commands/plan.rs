//! Plan command
//!
//! Loads both sources, diffs them and either prints the ordered plan or
//! deploys it to a file.

use std::path::{Path, PathBuf};

use pgcompose_migrations::{OutputFormat, PlanOptions, SchemaAction, plan_report, render};

use crate::error::CliError;
use crate::output;
use crate::source;

/// Resolved plan invocation (flags layered over config)
#[derive(Debug, Clone)]
pub struct PlanCommand {
    /// Current state source(s)
    pub base: String,
    /// Desired state source(s)
    pub updated: String,
    pub options: PlanOptions,
    pub format: OutputFormat,
    pub deploy: Option<PathBuf>,
    /// Write the deployment file instead of previewing it
    pub prod: bool,
}

/// Run the plan command
pub fn run(cmd: &PlanCommand) -> Result<(), CliError> {
    let base = source::load(&cmd.base)?;
    let updated = source::load(&cmd.updated)?;

    let actions = build_plan(&base, &updated, &cmd.options)?;
    let rendered = render(&actions, cmd.format)?;

    match &cmd.deploy {
        None => print_plan(&rendered, actions.len()),
        Some(path) if cmd.prod => write_deployment(path, &rendered)?,
        Some(path) => print_dry_run(path, &rendered, actions.len()),
    }

    Ok(())
}

/// Plan the migration, reporting structural fallbacks on stderr
pub fn build_plan(
    base: &[SchemaAction],
    updated: &[SchemaAction],
    options: &PlanOptions,
) -> Result<Vec<SchemaAction>, CliError> {
    let report = plan_report(base, updated, options)?;
    for warning in &report.warnings {
        eprintln!("{}", output::warn_line(&warning.to_string()));
    }

    tracing::debug!(
        actions = report.actions.len(),
        warnings = report.warnings.len(),
        "plan complete"
    );
    Ok(report.actions)
}

fn print_plan(rendered: &str, count: usize) {
    if count == 0 {
        eprintln!("{}", output::info("No schema changes detected"));
    }
    if !rendered.is_empty() {
        println!("{rendered}");
    }
}

fn print_dry_run(path: &Path, rendered: &str, count: usize) {
    println!(
        "{}",
        output::heading(&format!("Dry run for {}", path.display()))
    );
    println!();
    if !rendered.is_empty() {
        println!("{rendered}");
        println!();
    }
    println!("{}", output::muted(&format!("Total: {count} commands")));
    println!(
        "{}",
        output::info("Nothing was written. Re-run with --prod to write the deployment file.")
    );
}

fn write_deployment(path: &Path, rendered: &str) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| CliError::IoError(format!("{}: {e}", parent.display())))?;
    }

    let mut content = rendered.to_string();
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    std::fs::write(path, content)
        .map_err(|e| CliError::IoError(format!("{}: {e}", path.display())))?;

    println!(
        "{}",
        output::success(&format!("Deployment commands written to: {}", path.display()))
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgcompose_migrations::QueryType;

    #[test]
    fn build_plan_filters_before_diffing() {
        let updated = vec![
            SchemaAction::new(QueryType::BaseTable, "users", "CREATE TABLE users (id int);"),
            SchemaAction::new(QueryType::Grant, "grant_users", "GRANT SELECT ON users TO app;")
                .with_dependencies(["users"]),
        ];
        let options = PlanOptions::new().with_grants(false);

        let actions = build_plan(&[], &updated, &options).unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].command, "CREATE TABLE users (id int);");
    }

    #[test]
    fn build_plan_surfaces_cycles() {
        let updated = vec![
            SchemaAction::new(QueryType::View, "a", "CREATE VIEW a AS SELECT * FROM b;")
                .with_dependencies(["b"]),
            SchemaAction::new(QueryType::View, "b", "CREATE VIEW b AS SELECT * FROM a;")
                .with_dependencies(["a"]),
        ];

        let err = build_plan(&[], &updated, &PlanOptions::default()).unwrap_err();
        assert!(matches!(err, CliError::Plan(pgcompose_migrations::Error::Cyclic(_))));
    }

    #[test]
    fn deployment_file_ends_with_newline() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deploy.sql");

        write_deployment(&path, "CREATE TABLE t (id int);").unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "CREATE TABLE t (id int);\n"
        );
    }
}
