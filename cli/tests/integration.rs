//! End-to-end integration tests for the pgcompose CLI

use assert_cmd::cargo;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Get the pgcompose CLI binary
fn pgcompose() -> Command {
    Command::new(cargo::cargo_bin!("pgcompose"))
}

const BASE: &str = r#"[
    {
        "query_text": "CREATE TABLE users (id int);",
        "object_name": "users",
        "query_type": "base_table",
        "detail": {"kind": "table", "columns": [{"name": "id", "data_type": "int"}]}
    }
]"#;

const UPDATED: &str = r#"[
    {
        "query_text": "GRANT SELECT ON users TO app;",
        "object_name": "grant_select_users",
        "query_type": "grant",
        "resource_type": "table",
        "dependencies": ["users"],
        "detail": {"kind": "grant", "privileges": ["SELECT"], "grantees": ["app"], "target": "users"}
    },
    {
        "query_text": "CREATE TABLE users (id int, email text);",
        "object_name": "users",
        "query_type": "base_table",
        "detail": {
            "kind": "table",
            "columns": [
                {"name": "id", "data_type": "int"},
                {"name": "email", "data_type": "text"}
            ]
        }
    }
]"#;

const CYCLE: &str = r#"[
    {"query_text": "CREATE VIEW a AS SELECT * FROM b;", "object_name": "a", "query_type": "view", "dependencies": ["b"]},
    {"query_text": "CREATE VIEW b AS SELECT * FROM a;", "object_name": "b", "query_type": "view", "dependencies": ["a"]}
]"#;

/// Write a source file into the temp dir and return its path
fn source(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn fixtures() -> (TempDir, PathBuf, PathBuf) {
    let temp = TempDir::new().unwrap();
    let base = source(temp.path(), "base.json", BASE);
    let updated = source(temp.path(), "updated.json", UPDATED);
    (temp, base, updated)
}

mod plan {
    use super::*;

    #[test]
    fn prints_ordered_sql() {
        let (temp, base, updated) = fixtures();

        pgcompose()
            .current_dir(temp.path())
            .arg(&base)
            .arg(&updated)
            .arg("--grants")
            .assert()
            .success()
            .stdout(predicate::str::diff(
                "ALTER TABLE users ADD COLUMN email TEXT;\n\nGRANT SELECT ON users TO app;\n",
            ));
    }

    #[test]
    fn grants_are_opt_in() {
        let (temp, base, updated) = fixtures();

        pgcompose()
            .current_dir(temp.path())
            .arg(&base)
            .arg(&updated)
            .assert()
            .success()
            .stdout(predicate::str::diff("ALTER TABLE users ADD COLUMN email TEXT;\n"));

        pgcompose()
            .current_dir(temp.path())
            .arg(&base)
            .arg(&updated)
            .arg("--grants")
            .assert()
            .success()
            .stdout(predicate::str::contains("GRANT SELECT ON users TO app;"));
    }

    #[test]
    fn no_grants_drops_grant_statements() {
        let (temp, base, updated) = fixtures();

        pgcompose()
            .current_dir(temp.path())
            .arg(&base)
            .arg(&updated)
            .arg("--no-grants")
            .assert()
            .success()
            .stdout(predicate::str::contains("ADD COLUMN email TEXT"))
            .stdout(predicate::str::contains("GRANT").not());
    }

    #[test]
    fn json_output() {
        let (temp, base, updated) = fixtures();

        let output = pgcompose()
            .current_dir(temp.path())
            .arg(&base)
            .arg(&updated)
            .arg("--grants")
            .arg("--output-format=json")
            .output()
            .unwrap();
        assert!(output.status.success());

        let records: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(records[0]["query_type"], "base_table");
        assert_eq!(records[0]["object_name"], "users");
        assert_eq!(records[1]["query_type"], "grant");
        assert_eq!(records[1]["dependencies"][0], "users");
    }

    #[test]
    fn ast_output() {
        let (temp, base, updated) = fixtures();

        pgcompose()
            .current_dir(temp.path())
            .arg(&base)
            .arg(&updated)
            .arg("--grants")
            .arg("--output-format")
            .arg("ast")
            .assert()
            .success()
            .stdout(predicate::str::contains("base_table: users"))
            .stdout(predicate::str::contains("grant: grant_select_users (depends on users)"));
    }

    #[test]
    fn identical_sources_report_no_changes() {
        let (temp, base, _) = fixtures();

        pgcompose()
            .current_dir(temp.path())
            .arg(&base)
            .arg(&base)
            .assert()
            .success()
            .stdout(predicate::str::is_empty())
            .stderr(predicate::str::contains("No schema changes detected"));
    }

    #[test]
    fn comma_separated_sources_are_merged() {
        let temp = TempDir::new().unwrap();
        let empty = source(temp.path(), "empty.json", "[]");
        let part_one = source(
            temp.path(),
            "part1.json",
            r#"[{"query_text": "CREATE VIEW active AS SELECT * FROM users;", "object_name": "active", "query_type": "view", "dependencies": ["users"]}]"#,
        );
        let part_two = source(temp.path(), "part2.json", BASE);

        pgcompose()
            .current_dir(temp.path())
            .arg(&empty)
            .arg(format!("{},{}", part_one.display(), part_two.display()))
            .assert()
            .success()
            .stdout(predicate::str::diff(
                "CREATE TABLE users (id int);\n\nCREATE VIEW active AS SELECT * FROM users;\n",
            ));
    }

    #[test]
    fn schema_filter() {
        let temp = TempDir::new().unwrap();
        let empty = source(temp.path(), "empty.json", "[]");
        let updated = source(
            temp.path(),
            "updated.json",
            r#"[
                {"query_text": "CREATE TABLE app.users (id int);", "object_name": "users", "schema": "app", "query_type": "base_table"},
                {"query_text": "CREATE TABLE audit.log (id int);", "object_name": "log", "schema": "audit", "query_type": "base_table"}
            ]"#,
        );

        pgcompose()
            .current_dir(temp.path())
            .arg(&empty)
            .arg(&updated)
            .arg("--schemas=app,public")
            .assert()
            .success()
            .stdout(predicate::str::contains("app.users"))
            .stdout(predicate::str::contains("audit.log").not());
    }

    #[test]
    fn schema_filter_accepts_space_separated_names() {
        let temp = TempDir::new().unwrap();
        let empty = source(temp.path(), "empty.json", "[]");
        let updated = source(
            temp.path(),
            "updated.json",
            r#"[
                {"query_text": "CREATE TABLE app.users (id int);", "object_name": "users", "schema": "app", "query_type": "base_table"},
                {"query_text": "CREATE TABLE audit.log (id int);", "object_name": "log", "schema": "audit", "query_type": "base_table"},
                {"query_text": "CREATE TABLE accounts (id int);", "object_name": "accounts", "query_type": "base_table"}
            ]"#,
        );

        pgcompose()
            .current_dir(temp.path())
            .arg(&empty)
            .arg(&updated)
            .arg("--schemas")
            .arg("public")
            .arg("app")
            .assert()
            .success()
            .stdout(predicate::str::contains("app.users"))
            .stdout(predicate::str::contains("CREATE TABLE accounts"))
            .stdout(predicate::str::contains("audit.log").not());
    }
}

mod deploy {
    use super::*;

    #[test]
    fn dry_run_writes_nothing() {
        let (temp, base, updated) = fixtures();
        let target = temp.path().join("deploy.sql");

        pgcompose()
            .current_dir(temp.path())
            .arg(&base)
            .arg(&updated)
            .arg("--grants")
            .arg("--deploy")
            .arg(&target)
            .assert()
            .success()
            .stdout(predicate::str::contains("ALTER TABLE users ADD COLUMN email TEXT;"))
            .stdout(predicate::str::contains("Total: 2 commands"))
            .stdout(predicate::str::contains("Nothing was written"));

        assert!(!target.exists());
    }

    #[test]
    fn prod_writes_file() {
        let (temp, base, updated) = fixtures();
        let target = temp.path().join("out").join("deploy.sql");

        pgcompose()
            .current_dir(temp.path())
            .arg(&base)
            .arg(&updated)
            .arg("--grants")
            .arg("--deploy")
            .arg(&target)
            .arg("--prod")
            .assert()
            .success()
            .stdout(predicate::str::contains("Deployment commands written to:"));

        let content = std::fs::read_to_string(&target).unwrap();
        assert_eq!(
            content,
            "ALTER TABLE users ADD COLUMN email TEXT;\n\nGRANT SELECT ON users TO app;\n"
        );
    }

    #[test]
    fn dry_run_conflicts_with_prod() {
        let (temp, base, updated) = fixtures();

        pgcompose()
            .current_dir(temp.path())
            .arg(&base)
            .arg(&updated)
            .arg("--dry-run")
            .arg("--prod")
            .assert()
            .failure();
    }
}

mod config {
    use super::*;

    #[test]
    fn config_file_supplies_defaults() {
        let (temp, base, updated) = fixtures();
        std::fs::write(
            temp.path().join("pgcompose.toml"),
            "grants = true\noutput_format = \"ast\"\n",
        )
        .unwrap();

        pgcompose()
            .current_dir(temp.path())
            .arg(&base)
            .arg(&updated)
            .assert()
            .success()
            .stdout(predicate::str::contains("base_table: users"))
            .stdout(predicate::str::contains("grant: grant_select_users"));
    }

    #[test]
    fn flags_override_config() {
        let (temp, base, updated) = fixtures();
        std::fs::write(temp.path().join("pgcompose.toml"), "grants = true\n").unwrap();

        pgcompose()
            .current_dir(temp.path())
            .arg(&base)
            .arg(&updated)
            .arg("--no-grants")
            .assert()
            .success()
            .stdout(predicate::str::diff("ALTER TABLE users ADD COLUMN email TEXT;\n"));
    }

    #[test]
    fn explicit_missing_config_fails() {
        let (temp, base, updated) = fixtures();

        pgcompose()
            .current_dir(temp.path())
            .arg(&base)
            .arg(&updated)
            .arg("--config=missing.toml")
            .assert()
            .failure()
            .stderr(predicate::str::contains("config not found"));
    }
}

mod errors {
    use super::*;

    #[test]
    fn cycle_fails() {
        let temp = TempDir::new().unwrap();
        let empty = source(temp.path(), "empty.json", "[]");
        let cycle = source(temp.path(), "cycle.json", CYCLE);

        pgcompose()
            .current_dir(temp.path())
            .arg(&empty)
            .arg(&cycle)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Cyclic dependency detected between: a, b"));
    }

    #[test]
    fn malformed_source_fails() {
        let temp = TempDir::new().unwrap();
        let empty = source(temp.path(), "empty.json", "[]");
        let bad = source(temp.path(), "bad.json", "{\"query_text\": ");

        pgcompose()
            .current_dir(temp.path())
            .arg(&empty)
            .arg(&bad)
            .assert()
            .failure()
            .stderr(predicate::str::contains("failed to parse"));
    }

    #[test]
    fn missing_source_fails() {
        let temp = TempDir::new().unwrap();
        let empty = source(temp.path(), "empty.json", "[]");

        pgcompose()
            .current_dir(temp.path())
            .arg(&empty)
            .arg(temp.path().join("nope.json"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("failed to read"));
    }

    #[test]
    fn unknown_output_format_fails() {
        let (temp, base, updated) = fixtures();

        pgcompose()
            .current_dir(temp.path())
            .arg(&base)
            .arg(&updated)
            .arg("--output-format=yaml")
            .assert()
            .failure()
            .stderr(predicate::str::contains("unknown output format"));
    }
}
