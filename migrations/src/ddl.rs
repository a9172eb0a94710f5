//! Schema object model
//!
//! A [`SchemaAction`] is both the unit of input (one parsed DDL statement) and
//! the unit of output (one synthesized migration statement). Structural detail
//! is attached as a tagged [`Detail`] fixed at the parser boundary; nothing
//! downstream re-inspects SQL text to recover structure.

use crate::traits::{Entity, EntityKey, QueryType, ResourceType};
use crate::utils::{comma_list, content_hash, sha256_hex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// =============================================================================
// Schema Action
// =============================================================================

/// One DDL statement together with its identity and dependency metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawSchemaAction")]
pub struct SchemaAction {
    /// Verbatim SQL text
    #[serde(rename = "query_text")]
    pub command: String,
    pub object_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub query_type: QueryType,
    pub resource_type: ResourceType,
    /// Referenced names in first-seen order, without duplicates
    pub dependencies: Vec<String>,
    /// SHA-256 of the normalized command
    #[serde(rename = "query_hash")]
    pub content_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Detail>,
}

/// Wire shape of [`SchemaAction`]; hash and resource type may be omitted.
#[derive(Deserialize)]
struct RawSchemaAction {
    query_text: String,
    #[serde(default)]
    object_name: Option<String>,
    #[serde(default)]
    schema: Option<String>,
    #[serde(default)]
    query_type: QueryType,
    #[serde(default)]
    resource_type: ResourceType,
    #[serde(default)]
    dependencies: Vec<String>,
    #[serde(default)]
    query_hash: Option<String>,
    #[serde(default)]
    detail: Option<Detail>,
}

impl From<RawSchemaAction> for SchemaAction {
    fn from(raw: RawSchemaAction) -> Self {
        let content_hash = raw
            .query_hash
            .filter(|hash| !hash.is_empty())
            .unwrap_or_else(|| content_hash(&raw.query_text));

        Self {
            command: raw.query_text,
            object_name: raw.object_name.filter(|name| !name.is_empty()),
            schema: raw.schema.filter(|schema| !schema.is_empty()),
            query_type: raw.query_type,
            resource_type: raw.resource_type,
            dependencies: dedup_ordered(raw.dependencies),
            content_hash,
            detail: raw.detail,
        }
    }
}

impl SchemaAction {
    /// Create an action for a named object; the content hash is computed here.
    pub fn new(query_type: QueryType, object_name: impl Into<String>, command: impl Into<String>) -> Self {
        let command = command.into();
        Self {
            content_hash: content_hash(&command),
            command,
            object_name: Some(object_name.into()),
            schema: None,
            query_type,
            resource_type: ResourceType::default(),
            dependencies: Vec::new(),
            detail: None,
        }
    }

    /// Create an action with no object name (appended last by the sorter)
    pub fn unnamed(query_type: QueryType, command: impl Into<String>) -> Self {
        let command = command.into();
        Self {
            content_hash: content_hash(&command),
            command,
            object_name: None,
            schema: None,
            query_type,
            resource_type: ResourceType::default(),
            dependencies: Vec::new(),
            detail: None,
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dedup_ordered(dependencies.into_iter().map(Into::into));
        self
    }

    pub fn with_detail(mut self, detail: impl Into<Detail>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_resource_type(mut self, resource_type: ResourceType) -> Self {
        self.resource_type = resource_type;
        self
    }

    /// `schema.object_name` when a schema is present, else `object_name`
    pub fn qualified_name(&self) -> Option<String> {
        let name = self.object_name.as_deref()?;
        Some(match self.schema.as_deref() {
            Some(schema) => format!("{schema}.{name}"),
            None => name.to_string(),
        })
    }

    pub fn table_detail(&self) -> Option<&TableDetail> {
        match &self.detail {
            Some(Detail::Table(table)) => Some(table),
            _ => None,
        }
    }

    pub fn routine_detail(&self) -> Option<&RoutineDetail> {
        match &self.detail {
            Some(Detail::Routine(routine)) => Some(routine),
            _ => None,
        }
    }

    pub fn grant_detail(&self) -> Option<&GrantDetail> {
        match &self.detail {
            Some(Detail::Grant(grant)) => Some(grant),
            _ => None,
        }
    }

    /// Table an attached object (constraint, policy, trigger) lives on.
    ///
    /// Falls back to the first dependency when no attached detail is present.
    pub fn attached_table(&self) -> Option<&str> {
        match &self.detail {
            Some(Detail::Attached(attached)) => Some(attached.table.as_str()),
            _ => self.dependencies.first().map(String::as_str),
        }
    }
}

impl Entity for SchemaAction {
    fn key(&self) -> EntityKey {
        EntityKey::new(self.query_type, self.qualified_name().unwrap_or_default())
    }

    fn fingerprint(&self) -> &str {
        &self.content_hash
    }
}

impl fmt::Display for SchemaAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.qualified_name() {
            Some(name) => write!(f, "{}: {}", self.query_type, name)?,
            None => write!(f, "{}: unnamed", self.query_type)?,
        }
        if !self.dependencies.is_empty() {
            write!(f, " (depends on {})", comma_list(&self.dependencies))?;
        }
        Ok(())
    }
}

fn dedup_ordered<I: IntoIterator<Item = String>>(items: I) -> Vec<String> {
    let mut seen = BTreeSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

// =============================================================================
// Structural Detail
// =============================================================================

/// Structural detail attached by the parser, tagged by `kind`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Detail {
    Table(TableDetail),
    Routine(RoutineDetail),
    Grant(GrantDetail),
    Attached(AttachedDetail),
}

impl Detail {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Table(_) => "table",
            Self::Routine(_) => "routine",
            Self::Grant(_) => "grant",
            Self::Attached(_) => "attached",
        }
    }
}

impl From<TableDetail> for Detail {
    fn from(value: TableDetail) -> Self {
        Self::Table(value)
    }
}

impl From<RoutineDetail> for Detail {
    fn from(value: RoutineDetail) -> Self {
        Self::Routine(value)
    }
}

impl From<GrantDetail> for Detail {
    fn from(value: GrantDetail) -> Self {
        Self::Grant(value)
    }
}

impl From<AttachedDetail> for Detail {
    fn from(value: AttachedDetail) -> Self {
        Self::Attached(value)
    }
}

// =============================================================================
// Tables
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDetail {
    #[serde(default)]
    pub columns: Vec<TableColumn>,
    #[serde(default)]
    pub constraints: Vec<TableConstraint>,
}

impl TableDetail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(mut self, column: TableColumn) -> Self {
        self.columns.push(column);
        self
    }

    pub fn constraint(mut self, constraint: TableConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn find_column(&self, name: &str) -> Option<&TableColumn> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn primary_key(&self) -> Option<&TableConstraint> {
        self.constraints
            .iter()
            .find(|constraint| constraint.kind == ConstraintKind::PrimaryKey)
    }

    pub fn constraints_of(&self, kind: ConstraintKind) -> impl Iterator<Item = &TableConstraint> {
        self.constraints
            .iter()
            .filter(move |constraint| constraint.kind == kind)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumn {
    pub name: String,
    pub data_type: String,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

const fn default_nullable() -> bool {
    true
}

impl TableColumn {
    /// Nullable column without a default
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            default: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn default_value(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self
    }

    /// Data types compare case-insensitively
    pub fn same_type(&self, other: &Self) -> bool {
        self.data_type.eq_ignore_ascii_case(&other.data_type)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    PrimaryKey,
    ForeignKey,
    Unique,
    Check,
}

impl ConstraintKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PrimaryKey => "primary_key",
            Self::ForeignKey => "foreign_key",
            Self::Unique => "unique",
            Self::Check => "check",
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConstraint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: ConstraintKind,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<ForeignKeyTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

impl TableConstraint {
    fn with_kind<I, S>(kind: ConstraintKind, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: None,
            kind,
            columns: columns.into_iter().map(Into::into).collect(),
            references: None,
            expression: None,
        }
    }

    pub fn primary_key<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_kind(ConstraintKind::PrimaryKey, columns)
    }

    pub fn foreign_key<I, R>(columns: I, table: impl Into<String>, referenced: R) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        let mut constraint = Self::with_kind(ConstraintKind::ForeignKey, columns);
        constraint.references = Some(ForeignKeyTarget {
            table: table.into(),
            columns: referenced.into_iter().map(Into::into).collect(),
        });
        constraint
    }

    pub fn unique<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_kind(ConstraintKind::Unique, columns)
    }

    pub fn check(expression: impl Into<String>) -> Self {
        let mut constraint = Self::with_kind(ConstraintKind::Check, Vec::<String>::new());
        constraint.expression = Some(expression.into());
        constraint
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Column set, order-insensitive
    pub fn column_set(&self) -> BTreeSet<&str> {
        self.columns.iter().map(String::as_str).collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyTarget {
    pub table: String,
    #[serde(default)]
    pub columns: Vec<String>,
}

// =============================================================================
// Routines
// =============================================================================

/// Function or procedure signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawRoutineDetail")]
pub struct RoutineDetail {
    pub parameters: Vec<FunctionParameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// SHA-256 over ordered parameter types, return type and language
    pub signature_hash: String,
}

#[derive(Deserialize)]
struct RawRoutineDetail {
    #[serde(default)]
    parameters: Vec<FunctionParameter>,
    #[serde(default)]
    return_type: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    signature_hash: Option<String>,
}

impl From<RawRoutineDetail> for RoutineDetail {
    fn from(raw: RawRoutineDetail) -> Self {
        let mut detail = RoutineDetail::new(raw.parameters, raw.return_type, raw.language);
        if let Some(hash) = raw.signature_hash.filter(|hash| !hash.is_empty()) {
            detail.signature_hash = hash;
        }
        detail
    }
}

impl RoutineDetail {
    pub fn new(
        parameters: Vec<FunctionParameter>,
        return_type: Option<String>,
        language: Option<String>,
    ) -> Self {
        let signature_hash = signature_hash(&parameters, return_type.as_deref(), language.as_deref());
        Self {
            parameters,
            return_type,
            language,
            signature_hash,
        }
    }

    /// Parameter types that identify the routine in `DROP FUNCTION f(...)`.
    ///
    /// OUT parameters are not part of the identity.
    pub fn identity_types(&self) -> Vec<&str> {
        self.parameters
            .iter()
            .filter(|param| param.mode != Some(ParameterMode::Out))
            .map(|param| param.data_type.as_str())
            .collect()
    }
}

fn signature_hash(params: &[FunctionParameter], return_type: Option<&str>, language: Option<&str>) -> String {
    let types: Vec<&str> = params.iter().map(|param| param.data_type.as_str()).collect();
    sha256_hex(&format!(
        "{}|{}|{}",
        types.join(","),
        return_type.unwrap_or_default(),
        language.unwrap_or_default()
    ))
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterMode {
    In,
    Out,
    #[serde(alias = "in_out")]
    Inout,
    Variadic,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionParameter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ParameterMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl FunctionParameter {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            data_type: data_type.into(),
            mode: None,
            default: None,
        }
    }

    pub fn with_mode(mut self, mode: ParameterMode) -> Self {
        self.mode = Some(mode);
        self
    }
}

// =============================================================================
// Grants
// =============================================================================

/// Privileges granted to a set of roles on one target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantDetail {
    pub privileges: Vec<String>,
    pub grantees: Vec<String>,
    pub target: String,
}

impl GrantDetail {
    pub fn new<P, G>(privileges: P, grantees: G, target: impl Into<String>) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        G: IntoIterator,
        G::Item: Into<String>,
    {
        Self {
            privileges: privileges.into_iter().map(Into::into).collect(),
            grantees: grantees.into_iter().map(Into::into).collect(),
            target: target.into(),
        }
    }

    /// Privileges compare case-insensitively, order-insensitively
    pub fn privilege_set(&self) -> BTreeSet<String> {
        self.privileges
            .iter()
            .map(|privilege| privilege.trim().to_uppercase())
            .collect()
    }

    pub fn grantee_set(&self) -> BTreeSet<&str> {
        self.grantees.iter().map(|grantee| grantee.trim()).collect()
    }

    /// Same privileges, grantees and target
    pub fn same_grant(&self, other: &Self) -> bool {
        self.target == other.target
            && self.privilege_set() == other.privilege_set()
            && self.grantee_set() == other.grantee_set()
    }
}

// =============================================================================
// Attached Objects
// =============================================================================

/// Owning table of a constraint, policy or trigger
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedDetail {
    pub table: String,
}

impl AttachedDetail {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }
}
