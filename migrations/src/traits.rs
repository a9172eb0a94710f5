//! Core traits and discriminators for the schema object model
//!
//! - `QueryType` - the statement kind fixed at the parser boundary
//! - `ResourceType` - what a GRANT applies to
//! - `EntityKey` - the `(query_type, qualified_name)` identity used by the differ
//! - `Entity` - anything with an identity key and a content fingerprint

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

// =============================================================================
// Query Type
// =============================================================================

/// Statement kind discriminator.
///
/// Replaces string-based `query_type` fields with a proper enum. The serialized
/// form is the snake_case name used by the record format.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum QueryType {
    // Database-level objects
    Extension = 0,
    Schema = 1,
    Enum = 2,
    Domain = 3,
    CompositeType = 4,

    // Relations
    BaseTable = 10,
    DependentTable = 11,
    Sequence = 12,
    Index = 13,
    Constraint = 14,
    View = 15,
    MaterializedView = 16,

    // Routines and table-attached objects
    Function = 20,
    Procedure = 21,
    Trigger = 22,
    Policy = 23,

    // Privileges
    Grant = 30,

    #[default]
    Unknown = 255,
}

impl QueryType {
    pub const ALL: &'static [QueryType] = &[
        Self::Extension,
        Self::Schema,
        Self::Enum,
        Self::Domain,
        Self::CompositeType,
        Self::BaseTable,
        Self::DependentTable,
        Self::Sequence,
        Self::Index,
        Self::Constraint,
        Self::View,
        Self::MaterializedView,
        Self::Function,
        Self::Procedure,
        Self::Trigger,
        Self::Policy,
        Self::Grant,
        Self::Unknown,
    ];

    /// Get the string representation used by the record format
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Extension => "extension",
            Self::Schema => "schema",
            Self::Enum => "enum",
            Self::Domain => "domain",
            Self::CompositeType => "composite_type",
            Self::BaseTable => "base_table",
            Self::DependentTable => "dependent_table",
            Self::Sequence => "sequence",
            Self::Index => "index",
            Self::Constraint => "constraint",
            Self::View => "view",
            Self::MaterializedView => "materialized_view",
            Self::Function => "function",
            Self::Procedure => "procedure",
            Self::Trigger => "trigger",
            Self::Policy => "policy",
            Self::Grant => "grant",
            Self::Unknown => "unknown",
        }
    }

    /// Parse from string (for deserialization and CLI input)
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.as_str() == s)
    }

    /// SQL object keyword used in `DROP <keyword> ...`.
    ///
    /// `None` for kinds that have no standalone DROP form.
    pub const fn sql_keyword(self) -> Option<&'static str> {
        match self {
            Self::Extension => Some("EXTENSION"),
            Self::Schema => Some("SCHEMA"),
            Self::Enum | Self::CompositeType => Some("TYPE"),
            Self::Domain => Some("DOMAIN"),
            Self::BaseTable | Self::DependentTable => Some("TABLE"),
            Self::Sequence => Some("SEQUENCE"),
            Self::Index => Some("INDEX"),
            Self::View => Some("VIEW"),
            Self::MaterializedView => Some("MATERIALIZED VIEW"),
            Self::Function => Some("FUNCTION"),
            Self::Procedure => Some("PROCEDURE"),
            Self::Trigger => Some("TRIGGER"),
            Self::Policy => Some("POLICY"),
            Self::Constraint | Self::Grant | Self::Unknown => None,
        }
    }

    #[inline]
    pub const fn is_table(self) -> bool {
        matches!(self, Self::BaseTable | Self::DependentTable)
    }

    #[inline]
    pub const fn is_routine(self) -> bool {
        matches!(self, Self::Function | Self::Procedure)
    }
}

impl std::str::FromStr for QueryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown query type: {s}"))
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Resource Type
// =============================================================================

/// Resource a GRANT statement applies to
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Table,
    View,
    Function,
    Sequence,
    Schema,
    Database,
    #[default]
    Unknown,
}

impl ResourceType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::View => "view",
            Self::Function => "function",
            Self::Sequence => "sequence",
            Self::Schema => "schema",
            Self::Database => "database",
            Self::Unknown => "unknown",
        }
    }

    /// Keyword placed before the target in `GRANT ... ON <keyword> target`.
    ///
    /// Tables and views may be named bare.
    pub const fn target_keyword(self) -> Option<&'static str> {
        match self {
            Self::Function => Some("FUNCTION"),
            Self::Sequence => Some("SEQUENCE"),
            Self::Schema => Some("SCHEMA"),
            Self::Database => Some("DATABASE"),
            Self::Table | Self::View | Self::Unknown => None,
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Entity System
// =============================================================================

/// Identity of a schema object: `(query_type, qualified_name)`.
///
/// Ordering is lexicographic on the tuple using the query type's string name,
/// so iteration over a set of keys is reproducible.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EntityKey {
    pub kind: QueryType,
    pub name: String,
}

impl EntityKey {
    pub fn new(kind: QueryType, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

impl Ord for EntityKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.kind
            .as_str()
            .cmp(other.kind.as_str())
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl PartialOrd for EntityKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}

/// Trait for diffable schema entities.
pub trait Entity: Clone {
    /// Get the unique key for this entity
    fn key(&self) -> EntityKey;

    /// Content identity; equal fingerprints mean "unchanged"
    fn fingerprint(&self) -> &str;
}

/// Diff type for entity changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffType {
    Create,
    Drop,
    Alter,
}
