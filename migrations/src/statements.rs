//! Migration statement synthesis
//!
//! Differs produce typed [`Statement`]s; rendering to SQL text happens in one
//! place (`Statement::to_sql`). Identifiers are emitted as given, unquoted.

use crate::ddl::{
    ConstraintKind, Detail, ForeignKeyTarget, GrantDetail, RoutineDetail, SchemaAction,
    TableColumn, TableConstraint, TableDetail,
};
use crate::error::StructuralDiffError;
use crate::grammar::{
    default_name_for_check, default_name_for_fk, default_name_for_pk, default_name_for_unique,
};
use crate::traits::{QueryType, ResourceType};
use crate::utils::{comma_list, create_or_replace, normalize};
use std::collections::BTreeSet;

// =============================================================================
// Statements
// =============================================================================

/// One synthesized migration statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `DROP <keyword> <name>[(<arguments>)];`
    Drop {
        keyword: String,
        name: String,
        arguments: Option<Vec<String>>,
    },
    /// `DROP POLICY|TRIGGER <name> ON <table>;`
    DropOnTable {
        keyword: &'static str,
        name: String,
        table: String,
    },
    DropConstraint {
        table: String,
        name: String,
    },
    Revoke {
        grant: GrantDetail,
        resource: ResourceType,
    },
    AddColumn {
        table: String,
        column: TableColumn,
    },
    DropColumn {
        table: String,
        column: String,
    },
    AlterColumnType {
        table: String,
        column: String,
        data_type: String,
    },
    SetNotNull {
        table: String,
        column: String,
    },
    DropNotNull {
        table: String,
        column: String,
    },
    SetDefault {
        table: String,
        column: String,
        expression: String,
    },
    DropDefault {
        table: String,
        column: String,
    },
    AddPrimaryKey {
        table: String,
        columns: Vec<String>,
    },
    AddForeignKey {
        table: String,
        name: String,
        columns: Vec<String>,
        references: ForeignKeyTarget,
    },
    AddUnique {
        table: String,
        name: String,
        columns: Vec<String>,
    },
    AddCheck {
        table: String,
        name: String,
        expression: String,
    },
    /// Statement text taken from the updated snapshot (possibly rewritten)
    Raw(String),
}

impl Statement {
    pub fn to_sql(&self) -> String {
        match self {
            Self::Drop {
                keyword,
                name,
                arguments: Some(arguments),
            } => format!("DROP {keyword} {name}({});", comma_list(arguments)),
            Self::Drop { keyword, name, .. } => format!("DROP {keyword} {name};"),
            Self::DropOnTable {
                keyword,
                name,
                table,
            } => format!("DROP {keyword} {name} ON {table};"),
            Self::DropConstraint { table, name } => {
                format!("ALTER TABLE {table} DROP CONSTRAINT {name};")
            }
            Self::Revoke { grant, resource } => {
                let target = match resource.target_keyword() {
                    Some(keyword) => format!("{keyword} {}", grant.target),
                    None => grant.target.clone(),
                };
                format!(
                    "REVOKE {} ON {} FROM {};",
                    comma_list(&grant.privileges),
                    target,
                    comma_list(&grant.grantees)
                )
            }
            Self::AddColumn { table, column } => {
                let mut sql = format!(
                    "ALTER TABLE {table} ADD COLUMN {} {}",
                    column.name,
                    column.data_type.to_uppercase()
                );
                if !column.nullable {
                    sql.push_str(" NOT NULL");
                }
                if let Some(default) = &column.default {
                    sql.push_str(&format!(" DEFAULT {default}"));
                }
                sql.push(';');
                sql
            }
            Self::DropColumn { table, column } => {
                format!("ALTER TABLE {table} DROP COLUMN {column};")
            }
            Self::AlterColumnType {
                table,
                column,
                data_type,
            } => format!(
                "ALTER TABLE {table} ALTER COLUMN {column} TYPE {};",
                data_type.to_uppercase()
            ),
            Self::SetNotNull { table, column } => {
                format!("ALTER TABLE {table} ALTER COLUMN {column} SET NOT NULL;")
            }
            Self::DropNotNull { table, column } => {
                format!("ALTER TABLE {table} ALTER COLUMN {column} DROP NOT NULL;")
            }
            Self::SetDefault {
                table,
                column,
                expression,
            } => format!("ALTER TABLE {table} ALTER COLUMN {column} SET DEFAULT {expression};"),
            Self::DropDefault { table, column } => {
                format!("ALTER TABLE {table} ALTER COLUMN {column} DROP DEFAULT;")
            }
            Self::AddPrimaryKey { table, columns } => {
                format!("ALTER TABLE {table} ADD PRIMARY KEY ({});", comma_list(columns))
            }
            Self::AddForeignKey {
                table,
                name,
                columns,
                references,
            } => {
                let target = if references.columns.is_empty() {
                    references.table.clone()
                } else {
                    format!("{} ({})", references.table, comma_list(&references.columns))
                };
                format!(
                    "ALTER TABLE {table} ADD CONSTRAINT {name} FOREIGN KEY ({}) REFERENCES {target};",
                    comma_list(columns)
                )
            }
            Self::AddUnique {
                table,
                name,
                columns,
            } => format!(
                "ALTER TABLE {table} ADD CONSTRAINT {name} UNIQUE ({});",
                comma_list(columns)
            ),
            Self::AddCheck {
                table,
                name,
                expression,
            } => format!("ALTER TABLE {table} ADD CONSTRAINT {name} CHECK ({expression});"),
            Self::Raw(sql) => sql.clone(),
        }
    }
}

// =============================================================================
// Drops
// =============================================================================

/// Statement that removes `action`'s object.
///
/// Grants need their grant detail to be revoked; constraints, policies and
/// triggers need to know their table.
pub fn drop_statement(action: &SchemaAction) -> Result<Statement, StructuralDiffError> {
    let name = action
        .qualified_name()
        .ok_or(StructuralDiffError::Unnamed(action.query_type))?;
    let object = action.object_name.clone().unwrap_or_default();

    let on_table = |keyword: &'static str| -> Result<Statement, StructuralDiffError> {
        let table = action
            .attached_table()
            .ok_or_else(|| missing(action, "attached"))?;
        Ok(Statement::DropOnTable {
            keyword,
            name: object.clone(),
            table: table.to_string(),
        })
    };

    match action.query_type {
        QueryType::Grant => {
            let grant = action.grant_detail().ok_or_else(|| missing(action, "grant"))?;
            Ok(Statement::Revoke {
                grant: grant.clone(),
                resource: action.resource_type,
            })
        }
        QueryType::Constraint => {
            let table = action
                .attached_table()
                .ok_or_else(|| missing(action, "attached"))?;
            Ok(Statement::DropConstraint {
                table: table.to_string(),
                name: object.clone(),
            })
        }
        QueryType::Policy => on_table("POLICY"),
        QueryType::Trigger => on_table("TRIGGER"),
        QueryType::Function | QueryType::Procedure => Ok(Statement::Drop {
            keyword: keyword_for(action.query_type),
            name,
            arguments: action
                .routine_detail()
                .map(|routine| routine.identity_types().into_iter().map(str::to_string).collect()),
        }),
        kind => Ok(Statement::Drop {
            keyword: keyword_for(kind),
            name,
            arguments: None,
        }),
    }
}

fn keyword_for(kind: QueryType) -> String {
    kind.sql_keyword()
        .map(str::to_string)
        .unwrap_or_else(|| kind.as_str().to_uppercase())
}

fn missing(action: &SchemaAction, expected: &'static str) -> StructuralDiffError {
    StructuralDiffError::MissingDetail {
        query_type: action.query_type,
        name: action.qualified_name().unwrap_or_default(),
        expected,
    }
}

// =============================================================================
// Alters
// =============================================================================

/// Statements that migrate `base` to `updated` for an object present in both
/// snapshots with different content.
pub fn alter_statements(
    base: &SchemaAction,
    updated: &SchemaAction,
) -> Result<Vec<Statement>, StructuralDiffError> {
    match updated.query_type {
        QueryType::BaseTable | QueryType::DependentTable => {
            let old = detail_of(base, "table", as_table)?;
            let new = detail_of(updated, "table", as_table)?;
            let table = updated
                .qualified_name()
                .ok_or(StructuralDiffError::Unnamed(updated.query_type))?;
            diff_tables(&table, old, new)
        }
        QueryType::View => Ok(vec![Statement::Raw(create_or_replace(
            &updated.command,
            "VIEW",
        ))]),
        QueryType::MaterializedView => Ok(vec![
            drop_statement(base)?,
            Statement::Raw(updated.command.clone()),
        ]),
        QueryType::Function | QueryType::Procedure => {
            let old = detail_of(base, "routine", as_routine)?;
            let new = detail_of(updated, "routine", as_routine)?;
            if old.signature_hash == new.signature_hash {
                let keyword = keyword_for(updated.query_type);
                Ok(vec![Statement::Raw(create_or_replace(
                    &updated.command,
                    &keyword,
                ))])
            } else {
                Ok(vec![
                    drop_statement(base)?,
                    Statement::Raw(updated.command.clone()),
                ])
            }
        }
        QueryType::Grant => {
            let old = detail_of(base, "grant", as_grant)?;
            let new = detail_of(updated, "grant", as_grant)?;
            if old.same_grant(new) {
                Ok(Vec::new())
            } else {
                Ok(vec![
                    Statement::Revoke {
                        grant: old.clone(),
                        resource: base.resource_type,
                    },
                    Statement::Raw(updated.command.clone()),
                ])
            }
        }
        kind => Err(StructuralDiffError::Unsupported(kind)),
    }
}

/// Generic replace: drop the base object (when a drop can be formed), then
/// the updated statement verbatim.
pub fn fallback_statements(base: &SchemaAction, updated: &SchemaAction) -> Vec<Statement> {
    drop_statement(base)
        .into_iter()
        .chain(std::iter::once(Statement::Raw(updated.command.clone())))
        .collect()
}

fn as_table(detail: &Detail) -> Option<&TableDetail> {
    match detail {
        Detail::Table(table) => Some(table),
        _ => None,
    }
}

fn as_routine(detail: &Detail) -> Option<&RoutineDetail> {
    match detail {
        Detail::Routine(routine) => Some(routine),
        _ => None,
    }
}

fn as_grant(detail: &Detail) -> Option<&GrantDetail> {
    match detail {
        Detail::Grant(grant) => Some(grant),
        _ => None,
    }
}

fn detail_of<'a, T>(
    action: &'a SchemaAction,
    expected: &'static str,
    pick: fn(&'a Detail) -> Option<&'a T>,
) -> Result<&'a T, StructuralDiffError> {
    let detail = action.detail.as_ref().ok_or_else(|| missing(action, expected))?;
    pick(detail).ok_or_else(|| StructuralDiffError::MismatchedDetail {
        query_type: action.query_type,
        name: action.qualified_name().unwrap_or_default(),
        expected,
        found: detail.kind(),
    })
}

// =============================================================================
// Tables
// =============================================================================

/// Column and constraint statements for one table.
///
/// Output order: constraint drops, column adds, column drops, column alters,
/// constraint adds.
pub fn diff_tables(
    table: &str,
    old: &TableDetail,
    new: &TableDetail,
) -> Result<Vec<Statement>, StructuralDiffError> {
    let mut constraint_drops = Vec::new();
    let mut constraint_adds = Vec::new();

    diff_primary_keys(table, old, new, &mut constraint_drops, &mut constraint_adds);
    diff_keyed_constraints(table, old, new, &mut constraint_drops, &mut constraint_adds)?;

    let mut statements = constraint_drops;

    for column in &new.columns {
        if old.find_column(&column.name).is_none() {
            statements.push(Statement::AddColumn {
                table: table.to_string(),
                column: column.clone(),
            });
        }
    }

    for column in &old.columns {
        if new.find_column(&column.name).is_none() {
            statements.push(Statement::DropColumn {
                table: table.to_string(),
                column: column.name.clone(),
            });
        }
    }

    for column in &new.columns {
        if let Some(previous) = old.find_column(&column.name) {
            alter_column(table, previous, column, &mut statements);
        }
    }

    statements.extend(constraint_adds);
    Ok(statements)
}

fn alter_column(table: &str, old: &TableColumn, new: &TableColumn, out: &mut Vec<Statement>) {
    let table = table.to_string();
    let column = new.name.clone();

    if !old.same_type(new) {
        out.push(Statement::AlterColumnType {
            table: table.clone(),
            column: column.clone(),
            data_type: new.data_type.clone(),
        });
    }

    if old.nullable != new.nullable {
        out.push(if new.nullable {
            Statement::DropNotNull {
                table: table.clone(),
                column: column.clone(),
            }
        } else {
            Statement::SetNotNull {
                table: table.clone(),
                column: column.clone(),
            }
        });
    }

    if old.default != new.default {
        out.push(match &new.default {
            Some(expression) => Statement::SetDefault {
                table,
                column,
                expression: expression.clone(),
            },
            None => Statement::DropDefault { table, column },
        });
    }
}

fn diff_primary_keys(
    table: &str,
    old: &TableDetail,
    new: &TableDetail,
    drops: &mut Vec<Statement>,
    adds: &mut Vec<Statement>,
) {
    let old_pk = old.primary_key();
    let new_pk = new.primary_key();
    if old_pk.map(TableConstraint::column_set) == new_pk.map(TableConstraint::column_set) {
        return;
    }

    if let Some(pk) = old_pk {
        drops.push(Statement::DropConstraint {
            table: table.to_string(),
            name: pk
                .name
                .clone()
                .unwrap_or_else(|| default_name_for_pk(table)),
        });
    }
    if let Some(pk) = new_pk {
        adds.push(Statement::AddPrimaryKey {
            table: table.to_string(),
            columns: pk.columns.clone(),
        });
    }
}

/// Identity of a non-primary constraint; the name is not part of it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum ConstraintIdentity {
    ForeignKey {
        columns: Vec<String>,
        table: String,
        referenced: Vec<String>,
    },
    Unique(BTreeSet<String>),
    Check(String),
}

fn identity(table: &str, constraint: &TableConstraint) -> Result<ConstraintIdentity, StructuralDiffError> {
    let incomplete = |reason: &str| StructuralDiffError::IncompleteConstraint {
        table: table.to_string(),
        reason: reason.to_string(),
    };

    match constraint.kind {
        ConstraintKind::ForeignKey => {
            let references = constraint
                .references
                .as_ref()
                .ok_or_else(|| incomplete("foreign key without a referenced table"))?;
            if constraint.columns.is_empty() {
                return Err(incomplete("foreign key without columns"));
            }
            Ok(ConstraintIdentity::ForeignKey {
                columns: constraint.columns.clone(),
                table: references.table.clone(),
                referenced: references.columns.clone(),
            })
        }
        ConstraintKind::Unique => {
            if constraint.columns.is_empty() {
                return Err(incomplete("unique constraint without columns"));
            }
            Ok(ConstraintIdentity::Unique(
                constraint.columns.iter().cloned().collect(),
            ))
        }
        ConstraintKind::Check => constraint
            .expression
            .as_deref()
            .map(|expression| ConstraintIdentity::Check(normalize(expression)))
            .ok_or_else(|| incomplete("check constraint without an expression")),
        ConstraintKind::PrimaryKey => Err(incomplete("primary key handled separately")),
    }
}

fn diff_keyed_constraints(
    table: &str,
    old: &TableDetail,
    new: &TableDetail,
    drops: &mut Vec<Statement>,
    adds: &mut Vec<Statement>,
) -> Result<(), StructuralDiffError> {
    let keyed = |detail: &TableDetail| -> Result<Vec<(ConstraintIdentity, TableConstraint)>, StructuralDiffError> {
        detail
            .constraints
            .iter()
            .filter(|constraint| constraint.kind != ConstraintKind::PrimaryKey)
            .map(|constraint| Ok((identity(table, constraint)?, constraint.clone())))
            .collect()
    };
    let old_keyed = keyed(old)?;
    let new_keyed = keyed(new)?;

    for (id, constraint) in &old_keyed {
        if !new_keyed.iter().any(|(other, _)| other == id) {
            drops.push(Statement::DropConstraint {
                table: table.to_string(),
                name: constraint_name(table, constraint),
            });
        }
    }

    // foreign keys last
    let mut added: Vec<&(ConstraintIdentity, TableConstraint)> = new_keyed
        .iter()
        .filter(|(id, _)| !old_keyed.iter().any(|(other, _)| other == id))
        .collect();
    added.sort_by_key(|(_, constraint)| constraint.kind == ConstraintKind::ForeignKey);

    for (_, constraint) in added {
        adds.push(add_constraint(table, constraint)?);
    }
    Ok(())
}

fn constraint_name(table: &str, constraint: &TableConstraint) -> String {
    if let Some(name) = &constraint.name {
        return name.clone();
    }
    match constraint.kind {
        ConstraintKind::PrimaryKey => default_name_for_pk(table),
        ConstraintKind::ForeignKey => default_name_for_fk(table, &constraint.columns),
        ConstraintKind::Unique => default_name_for_unique(table, &constraint.columns),
        ConstraintKind::Check => default_name_for_check(table, &constraint.columns),
    }
}

fn add_constraint(table: &str, constraint: &TableConstraint) -> Result<Statement, StructuralDiffError> {
    let name = constraint_name(table, constraint);
    let table = table.to_string();
    let incomplete = |reason: &str| StructuralDiffError::IncompleteConstraint {
        table: table.clone(),
        reason: reason.to_string(),
    };

    Ok(match constraint.kind {
        ConstraintKind::ForeignKey => Statement::AddForeignKey {
            name,
            columns: constraint.columns.clone(),
            references: constraint
                .references
                .clone()
                .ok_or_else(|| incomplete("foreign key without a referenced table"))?,
            table,
        },
        ConstraintKind::Unique => Statement::AddUnique {
            name,
            columns: constraint.columns.clone(),
            table,
        },
        ConstraintKind::Check => Statement::AddCheck {
            name,
            expression: constraint
                .expression
                .clone()
                .ok_or_else(|| incomplete("check constraint without an expression"))?,
            table,
        },
        ConstraintKind::PrimaryKey => Statement::AddPrimaryKey {
            columns: constraint.columns.clone(),
            table,
        },
    })
}
