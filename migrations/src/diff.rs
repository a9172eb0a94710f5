//! Schema diff between two snapshots
//!
//! [`diff_schemas`] classifies every `(query_type, qualified_name)` key of the
//! two snapshots and turns each change into migration actions. A structural
//! differ that cannot compare an object never aborts the run: the object falls
//! back to drop-and-recreate and the failure is kept on [`SchemaDiff::warnings`].

use crate::collection::{Collection, diff_collections};
use crate::ddl::SchemaAction;
use crate::error::StructuralDiffError;
use crate::statements::{Statement, alter_statements, drop_statement, fallback_statements};
use crate::tracing::{trace_diff, trace_fallback};
use crate::traits::{DiffType, EntityKey};
use crate::utils::sequence_hash;

/// One classified key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectChange {
    pub diff_type: DiffType,
    pub key: EntityKey,
}

/// A structural comparison or drop that could not be carried out as designed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffWarning {
    pub key: EntityKey,
    pub error: StructuralDiffError,
    /// The object was replaced with the generic drop-and-recreate sequence.
    /// `false` means nothing could be emitted for it.
    pub fallback: bool,
}

impl std::fmt::Display for DiffWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let outcome = if self.fallback {
            "dropped and recreated"
        } else {
            "skipped"
        };
        write!(f, "{}: {} ({outcome})", self.key, self.error)
    }
}

/// Complete diff between two snapshots, actions in key order (unsorted)
#[derive(Debug, Clone, Default)]
pub struct SchemaDiff {
    pub actions: Vec<SchemaAction>,
    pub changes: Vec<ObjectChange>,
    pub warnings: Vec<DiffWarning>,
}

impl SchemaDiff {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn into_actions(self) -> Vec<SchemaAction> {
        self.actions
    }

    /// Keys that only exist in the updated snapshot
    pub fn created(&self) -> Vec<&EntityKey> {
        self.keys_of(DiffType::Create)
    }

    /// Keys that only exist in the base snapshot
    pub fn dropped(&self) -> Vec<&EntityKey> {
        self.keys_of(DiffType::Drop)
    }

    /// Keys present on both sides with different content
    pub fn altered(&self) -> Vec<&EntityKey> {
        self.keys_of(DiffType::Alter)
    }

    fn keys_of(&self, diff_type: DiffType) -> Vec<&EntityKey> {
        self.changes
            .iter()
            .filter(|change| change.diff_type == diff_type)
            .map(|change| &change.key)
            .collect()
    }
}

/// Diff `base` against `updated`.
///
/// Duplicate keys within one side are resolved last-write-wins. Keys are
/// visited in sorted order, so the result is deterministic for equal inputs.
pub fn diff_schemas(base: &[SchemaAction], updated: &[SchemaAction]) -> SchemaDiff {
    let base: Collection<SchemaAction> = base.iter().cloned().collect();
    let updated: Collection<SchemaAction> = updated.iter().cloned().collect();

    let mut diff = SchemaDiff::default();

    for entry in diff_collections(&base, &updated) {
        trace_diff!(entry.diff_type, entry.key);

        match (entry.diff_type, entry.left, entry.right) {
            (DiffType::Create, _, Some(created)) => diff.actions.push(created.clone()),
            (DiffType::Drop, Some(dropped), _) => match drop_statement(dropped) {
                Ok(statement) => diff.actions.extend(synthesize(dropped, vec![statement])),
                Err(error) => {
                    trace_fallback!(entry.key, error);
                    diff.warnings.push(DiffWarning {
                        key: entry.key.clone(),
                        error,
                        fallback: false,
                    });
                }
            },
            (DiffType::Alter, Some(old), Some(new)) => match alter_statements(old, new) {
                Ok(statements) => diff.actions.extend(synthesize(new, statements)),
                Err(error) => {
                    trace_fallback!(entry.key, error);
                    diff.actions
                        .extend(synthesize(new, fallback_statements(old, new)));
                    diff.warnings.push(DiffWarning {
                        key: entry.key.clone(),
                        error,
                        fallback: true,
                    });
                }
            },
            _ => continue,
        }

        diff.changes.push(ObjectChange {
            diff_type: entry.diff_type,
            key: entry.key,
        });
    }

    diff
}

/// Wrap synthesized statements as actions carrying `source`'s identity and
/// dependencies, each with its own sequence hash.
fn synthesize(source: &SchemaAction, statements: Vec<Statement>) -> Vec<SchemaAction> {
    statements
        .iter()
        .enumerate()
        .map(|(index, statement)| {
            let command = statement.to_sql();
            SchemaAction {
                content_hash: sequence_hash(&source.content_hash, index, &command),
                command,
                object_name: source.object_name.clone(),
                schema: source.schema.clone(),
                query_type: source.query_type,
                resource_type: source.resource_type,
                dependencies: source.dependencies.clone(),
                detail: None,
            }
        })
        .collect()
}
